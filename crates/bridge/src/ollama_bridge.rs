//! REST client for the Ollama bridge service.
//!
//! The bridge is a small local HTTP service that fronts Ollama for
//! two jobs: tagging a character image with visual keywords
//! (`POST /scan-face`, multipart) and rewriting scene text in the
//! director's style (`POST /generate-story`, JSON). Both endpoints
//! answer with a `{status: "success", ...}` envelope on success.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// Default base URL of the local bridge service.
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8000";

/// HTTP client for the Ollama bridge.
pub struct OllamaBridge {
    client: reqwest::Client,
    base_url: String,
}

/// Request body for the story rewrite endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoryRequest {
    /// Instruction prompt (style + scene text).
    pub prompt: String,
    /// Preceding scenes rendered as context, or a placeholder.
    pub context: String,
    /// Ollama model name, e.g. `dolphin-mistral:7b`.
    pub model: String,
    /// Base URL of the Ollama instance the bridge should talk to.
    pub ollama_url: String,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    status: String,
    /// Keywords on success; the server reuses this field for its
    /// error message on failure.
    #[serde(default)]
    suggested_keywords: String,
}

#[derive(Debug, Deserialize)]
struct StoryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    text: String,
    detail: Option<String>,
}

impl OllamaBridge {
    /// Create a client for a bridge instance.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base URL of the bridge service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scan a character image for visual keywords.
    ///
    /// Posts the image plus the vision model configuration as
    /// multipart form data. Returns the suggested keyword string on
    /// success; a `status: "error"` envelope surfaces the
    /// server-provided message.
    pub async fn scan_face(
        &self,
        image: Vec<u8>,
        file_name: &str,
        ollama_url: &str,
        vision_model: &str,
    ) -> Result<String, BridgeError> {
        tracing::debug!(file_name, vision_model, "submitting face scan");

        let part = reqwest::multipart::Part::bytes(image).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("ollama_url", ollama_url.to_string())
            .text("vision_model", vision_model.to_string());

        let response = self
            .client
            .post(format!("{}/scan-face", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: ScanResponse = parse_response(response).await?;
        if body.status == "success" {
            tracing::debug!("face scan complete");
            Ok(body.suggested_keywords)
        } else {
            Err(BridgeError::Service(if body.suggested_keywords.is_empty() {
                "face scan failed".to_string()
            } else {
                body.suggested_keywords
            }))
        }
    }

    /// Rewrite scene text via the story engine.
    ///
    /// Returns the rewritten text on success; failures surface the
    /// body's `detail` field when present.
    pub async fn generate_story(&self, request: &StoryRequest) -> Result<String, BridgeError> {
        tracing::debug!(model = %request.model, "submitting story rewrite");

        let response = self
            .client
            .post(format!("{}/generate-story", self.base_url))
            .json(request)
            .send()
            .await?;

        let body: StoryResponse = parse_response(response).await?;
        if body.status == "success" && !body.text.is_empty() {
            tracing::debug!(chars = body.text.len(), "story rewrite complete");
            Ok(body.text)
        } else {
            Err(BridgeError::Service(
                body.detail
                    .unwrap_or_else(|| "story engine returned no text".to_string()),
            ))
        }
    }
}

// ---- shared response handling ----

/// Ensure a success status code, surfacing the body's `detail` field
/// (FastAPI-style) or raw text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, BridgeError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from))
            .unwrap_or(body);
        return Err(BridgeError::Api {
            status: status.as_u16(),
            body: message,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BridgeError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_request_serializes_the_wire_shape() {
        let request = StoryRequest {
            prompt: "Style: noir. Rewrite this scene: text".to_string(),
            context: "No previous scenes.".to_string(),
            model: "dolphin-mistral:7b".to_string(),
            ollama_url: "http://127.0.0.1:11434".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "prompt": "Style: noir. Rewrite this scene: text",
                "context": "No previous scenes.",
                "model": "dolphin-mistral:7b",
                "ollama_url": "http://127.0.0.1:11434",
            })
        );
    }

    #[test]
    fn scan_envelope_parses_success() {
        let body: ScanResponse =
            serde_json::from_str(r#"{"status": "success", "suggested_keywords": "silver hair"}"#)
                .unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(body.suggested_keywords, "silver hair");
    }

    #[test]
    fn scan_envelope_tolerates_missing_keywords() {
        let body: ScanResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert_eq!(body.status, "error");
        assert!(body.suggested_keywords.is_empty());
    }

    #[test]
    fn story_envelope_parses_success_and_detail() {
        let ok: StoryResponse =
            serde_json::from_str(r#"{"status": "success", "text": "Rewritten."}"#).unwrap();
        assert_eq!(ok.status, "success");
        assert_eq!(ok.text, "Rewritten.");

        let err: StoryResponse =
            serde_json::from_str(r#"{"detail": "model not found"}"#).unwrap();
        assert_eq!(err.detail.as_deref(), Some("model not found"));
        assert!(err.status.is_empty());
    }
}
