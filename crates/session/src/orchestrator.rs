//! Remote-service orchestration.
//!
//! [`Orchestrator`] owns the two service clients and drives the four
//! integrations: story rewrite, scene illustration, face scanning,
//! and the diffusion connectivity probe. Results are written back into
//! the [`ProjectSession`]; a failed remote call never mutates the
//! project.
//!
//! There is deliberately no in-flight guard, de-duplication, or retry:
//! overlapping calls race independently and the last response to land
//! wins, matching the single-user interaction model.

use forge_bridge::{
    data_uri, BridgeError, ConnectionStatus, DiffusionApi, OllamaBridge, StoryRequest,
    Txt2ImgRequest,
};
use forge_core::{card, prompt};

use crate::session::{ProjectSession, SessionError};

/// Context placeholder when no preceding scenes exist.
const NO_CONTEXT: &str = "No previous scenes.";

/// Number of preceding scenes sent as rewrite context.
const CONTEXT_SCENES: usize = 2;

/// Fallbacks when the project settings leave a field blank.
const FALLBACK_STORY_MODEL: &str = "dolphin-mistral:7b";
const FALLBACK_OLLAMA_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Drives the remote generation services for one session.
pub struct Orchestrator {
    bridge: OllamaBridge,
    diffusion: DiffusionApi,
    connectivity: ConnectionStatus,
}

impl Orchestrator {
    pub fn new(bridge: OllamaBridge, diffusion: DiffusionApi) -> Self {
        Self {
            bridge,
            diffusion,
            connectivity: ConnectionStatus::Failed,
        }
    }

    /// Last recorded diffusion connectivity status.
    pub fn connectivity(&self) -> ConnectionStatus {
        self.connectivity
    }

    /// Probe the diffusion backend and record the result.
    pub async fn probe_diffusion(&mut self) -> ConnectionStatus {
        self.connectivity = self.diffusion.check_connection().await;
        self.connectivity
    }

    /// Rewrite the active scene's text through the story engine.
    ///
    /// Context is up to the two preceding scenes; the instruction
    /// combines the director style with the current text. On success
    /// the rewritten text replaces the scene's text and is persisted.
    pub async fn rewrite_scene(
        &self,
        session: &mut ProjectSession,
    ) -> Result<(), OrchestratorError> {
        let request = build_story_request(session);
        let text = self.bridge.generate_story(&request).await?;
        session.update_scene_text(text)?;
        Ok(())
    }

    /// Generate an illustration for the active scene.
    ///
    /// Synthesizes the prompt from scene + cast state, renders with
    /// the fixed sampling parameters, and attaches the first returned
    /// image to the scene as a data URI.
    pub async fn illustrate_scene(
        &self,
        session: &mut ProjectSession,
    ) -> Result<String, OrchestratorError> {
        let scene = session.active_scene();
        let project = session.project();
        let full_prompt = prompt::build_prompt(
            scene,
            &project.cast,
            &project.settings.director_style,
        );
        tracing::debug!(chars = full_prompt.len(), scene = scene.id, "synthesized prompt");

        let scene_id = scene.id;
        let image = self
            .diffusion
            .txt2img(&Txt2ImgRequest::new(full_prompt))
            .await?;
        session.set_scene_image(scene_id, image.clone())?;
        Ok(image)
    }

    /// Tag an image with visual keywords via the vision model.
    pub async fn scan_face(
        &self,
        session: &ProjectSession,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<String, OrchestratorError> {
        let settings = &session.project().settings;
        Ok(self
            .bridge
            .scan_face(
                image,
                file_name,
                &settings.ollama_url,
                &settings.vision_model,
            )
            .await?)
    }

    /// Import a character card into the cast.
    ///
    /// When the card embeds a base64 avatar, its keywords are
    /// auto-generated by a vision scan; a failed scan is non-fatal and
    /// falls back to the generic keyword string. Returns the imported
    /// character's name.
    pub async fn import_character_card(
        &self,
        session: &mut ProjectSession,
        raw: &str,
    ) -> Result<String, OrchestratorError> {
        let parsed = card::parse_character_card(raw).map_err(SessionError::from)?;
        let name = parsed.name.clone();

        let keywords = if parsed.has_data_uri_avatar() {
            let avatar = parsed.avatar_url.as_deref().unwrap_or_default();
            match self.scan_avatar(session, &name, avatar).await {
                Ok(keywords) => Some(keywords),
                Err(e) => {
                    tracing::warn!(character = %name, error = %e, "avatar scan failed, using default keywords");
                    None
                }
            }
        } else {
            None
        };

        session.add_cast_member(parsed.into_draft(keywords))?;
        tracing::info!(character = %name, "character card imported");
        Ok(name)
    }

    async fn scan_avatar(
        &self,
        session: &ProjectSession,
        name: &str,
        avatar: &str,
    ) -> Result<String, OrchestratorError> {
        let (_mime, bytes) = data_uri::decode(avatar)?;
        self.scan_face(session, bytes, &format!("{name}_avatar.png"))
            .await
    }
}

/// Assemble the story-rewrite request for the active scene.
fn build_story_request(session: &ProjectSession) -> StoryRequest {
    let project = session.project();
    let index = session.active_scene_index();
    let scene = session.active_scene();

    let context = project.scenes[index.saturating_sub(CONTEXT_SCENES)..index]
        .iter()
        .map(|s| format!("Scene {}: {}", s.id, s.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    let context = if context.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        context
    };

    let settings = &project.settings;
    StoryRequest {
        prompt: format!(
            "Style: {}. Rewrite this scene: {}",
            settings.director_style, scene.text
        ),
        context,
        model: non_blank(&settings.story_model, FALLBACK_STORY_MODEL),
        ollama_url: non_blank(&settings.ollama_url, FALLBACK_OLLAMA_URL),
    }
}

fn non_blank(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
