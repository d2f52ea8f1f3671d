//! REST client for the Stable Diffusion backend (A1111/Forge API).
//!
//! Wraps the txt2img route and a two-stage connectivity probe. The
//! sampling parameters are fixed: scene illustration always renders
//! 768x512 at 30 steps with "Euler a" and a random seed.

use serde::{Deserialize, Serialize};

use crate::data_uri;
use crate::error::BridgeError;
use crate::ollama_bridge::parse_response;

/// Default base URL of the diffusion backend.
pub const DEFAULT_DIFFUSION_URL: &str = "http://127.0.0.1:7860";

/// Negative prompt applied to every generation.
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "blurry, low quality, distorted, ugly, deformed, nsfw";

/// Outcome of the connectivity probe. The three states are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The primary API answered 2xx on its options route.
    Primary,
    /// The options route failed but the bare base URL produced *some*
    /// HTTP response: the service exists but does not speak the
    /// primary API (e.g. a ComfyUI or CORS-restricted server).
    Fallback,
    /// No response at all.
    Failed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "Connected (primary API)",
            Self::Fallback => "Connected (fallback probe)",
            Self::Failed => "Connection failed",
        }
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for the txt2img route.
#[derive(Debug, Clone, Serialize)]
pub struct Txt2ImgRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub sampler_name: String,
    /// -1 asks the backend for a random seed.
    pub seed: i64,
}

impl Txt2ImgRequest {
    /// A request with the fixed scene-illustration parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            steps: 30,
            cfg_scale: 7.0,
            width: 768,
            height: 512,
            sampler_name: "Euler a".to_string(),
            seed: -1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// HTTP client for a single diffusion backend.
pub struct DiffusionApi {
    client: reqwest::Client,
    base_url: String,
}

impl DiffusionApi {
    /// Create a client targeting a diffusion backend.
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

    /// Base HTTP URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate one image and return it as a PNG data URI.
    ///
    /// An empty or missing `images` array in an otherwise successful
    /// response is an error.
    pub async fn txt2img(&self, request: &Txt2ImgRequest) -> Result<String, BridgeError> {
        tracing::debug!(chars = request.prompt.len(), "submitting txt2img");

        let response = self
            .client
            .post(format!("{}/sdapi/v1/txt2img", self.base_url))
            .json(request)
            .send()
            .await?;

        let body: Txt2ImgResponse = parse_response(response).await?;
        let first = body.images.into_iter().next().ok_or_else(|| {
            BridgeError::Service("no images returned from the diffusion backend".to_string())
        })?;

        tracing::info!("image generated");
        Ok(data_uri::png_data_uri(&first))
    }

    /// Probe connectivity.
    ///
    /// First tries `GET /sdapi/v1/options`; a 2xx means the primary
    /// API is up. On failure, a request against the bare base URL
    /// distinguishes "something is listening" from "unreachable".
    pub async fn check_connection(&self) -> ConnectionStatus {
        let options = self
            .client
            .get(format!("{}/sdapi/v1/options", self.base_url))
            .send()
            .await;

        let status = match options {
            Ok(response) if response.status().is_success() => ConnectionStatus::Primary,
            _ => match self.client.get(&self.base_url).send().await {
                Ok(_) => ConnectionStatus::Fallback,
                Err(_) => ConnectionStatus::Failed,
            },
        };

        tracing::info!(base_url = %self.base_url, status = %status, "diffusion probe");
        status
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_fixed_sampling_parameters() {
        let request = Txt2ImgRequest::new("a dark alley");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "prompt": "a dark alley",
                "negative_prompt": DEFAULT_NEGATIVE_PROMPT,
                "steps": 30,
                "cfg_scale": 7.0,
                "width": 768,
                "height": 512,
                "sampler_name": "Euler a",
                "seed": -1,
            })
        );
    }

    #[test]
    fn response_tolerates_missing_images_field() {
        let body: Txt2ImgResponse = serde_json::from_str("{}").unwrap();
        assert!(body.images.is_empty());
    }

    #[test]
    fn status_labels_are_distinct() {
        assert_eq!(ConnectionStatus::Primary.as_str(), "Connected (primary API)");
        assert_eq!(
            ConnectionStatus::Fallback.as_str(),
            "Connected (fallback probe)"
        );
        assert_eq!(ConnectionStatus::Failed.as_str(), "Connection failed");
    }

    #[test]
    fn only_failed_counts_as_disconnected() {
        assert!(ConnectionStatus::Primary.is_connected());
        assert!(ConnectionStatus::Fallback.is_connected());
        assert!(!ConnectionStatus::Failed.is_connected());
    }
}
