//! The active editing session.
//!
//! [`ProjectSession`] owns the project aggregate and an active-scene
//! cursor. Every mutation goes through the same path: compute the next
//! [`ProjectData`] with a pure transform from `forge-core`, persist
//! it, then adopt it. A failed transform or a failed write leaves the
//! previous state untouched.

use forge_core::project::{self, CastMemberDraft, ProjectSettings};
use forge_core::types::EntityId;
use forge_core::{chatlog, document, script, segment, CoreError, ProjectData, Scene};

use crate::store::{SessionStore, StoreError};

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single-user editing session over one project.
pub struct ProjectSession {
    project: ProjectData,
    active_scene: usize,
    store: SessionStore,
}

impl ProjectSession {
    /// Open a session: the stored project if one exists and parses,
    /// else the built-in default.
    pub fn open(store: SessionStore) -> Self {
        let project = store.load().unwrap_or_default();
        Self {
            project,
            active_scene: 0,
            store,
        }
    }

    // -- reads ---------------------------------------------------------------

    pub fn project(&self) -> &ProjectData {
        &self.project
    }

    pub fn active_scene_index(&self) -> usize {
        self.active_scene
    }

    /// The scene currently under edit. Always present: the project
    /// never has zero scenes and the cursor is kept in bounds.
    pub fn active_scene(&self) -> &Scene {
        &self.project.scenes[self.active_scene]
    }

    /// Render the project as a plain-text director's script.
    pub fn render_script(&self) -> String {
        script::render_script(&self.project)
    }

    /// Serialize the project as a `.forge` export document.
    pub fn export_project(&self) -> Result<String, SessionError> {
        Ok(document::to_json(&document::export(&self.project))?)
    }

    // -- cursor --------------------------------------------------------------

    pub fn set_active_scene(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.project.scenes.len() {
            return Err(CoreError::Validation(format!(
                "scene index {index} out of bounds ({} scenes)",
                self.project.scenes.len()
            ))
            .into());
        }
        self.active_scene = index;
        Ok(())
    }

    // -- scene mutations -----------------------------------------------------

    /// Append a blank scene.
    pub fn add_scene(&mut self) -> Result<EntityId, SessionError> {
        let next = project::add_scene(&self.project);
        let id = next.scenes.last().map(|s| s.id).unwrap_or_default();
        self.replace(next)?;
        Ok(id)
    }

    /// Delete a scene by id, clamping the cursor back into bounds.
    /// Refused (no state change) when only one scene remains.
    pub fn delete_scene(&mut self, id: EntityId) -> Result<(), SessionError> {
        let next = project::delete_scene(&self.project, id)?;
        self.replace(next)
    }

    pub fn update_scene_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let id = self.active_scene().id;
        let next = project::update_scene_text(&self.project, id, text)?;
        self.replace(next)
    }

    pub fn update_scene_mood(&mut self, mood: impl Into<String>) -> Result<(), SessionError> {
        let id = self.active_scene().id;
        let next = project::update_scene_mood(&self.project, id, mood)?;
        self.replace(next)
    }

    /// Set the active scene's characters from a comma-separated string.
    pub fn set_scene_characters(&mut self, characters: &str) -> Result<(), SessionError> {
        let id = self.active_scene().id;
        let next = project::set_scene_characters(&self.project, id, characters)?;
        self.replace(next)
    }

    /// Append clarifying context to the active scene.
    pub fn inject_context(&mut self, context: &str) -> Result<(), SessionError> {
        let id = self.active_scene().id;
        let next = project::inject_context(&self.project, id, context)?;
        self.replace(next)
    }

    /// Attach a generated illustration to a scene.
    pub fn set_scene_image(
        &mut self,
        id: EntityId,
        data_uri: impl Into<String>,
    ) -> Result<(), SessionError> {
        let next = project::set_scene_image(&self.project, id, data_uri)?;
        self.replace(next)
    }

    /// Approve the active scene and advance the cursor when a next
    /// scene exists.
    pub fn approve_and_advance(&mut self) -> Result<(), SessionError> {
        let id = self.active_scene().id;
        let next = project::approve_scene(&self.project, id)?;
        self.replace(next)?;
        if self.active_scene + 1 < self.project.scenes.len() {
            self.active_scene += 1;
        }
        Ok(())
    }

    // -- cast mutations ------------------------------------------------------

    pub fn add_cast_member(&mut self, draft: CastMemberDraft) -> Result<EntityId, SessionError> {
        let next = project::add_cast_member(&self.project, draft);
        let id = next.cast.last().map(|m| m.id).unwrap_or_default();
        self.replace(next)?;
        Ok(id)
    }

    pub fn remove_cast_member(&mut self, id: EntityId) -> Result<(), SessionError> {
        let next = project::remove_cast_member(&self.project, id)?;
        self.replace(next)
    }

    pub fn update_cast_member(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
        role: impl Into<String>,
        keywords: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<(), SessionError> {
        let next =
            project::update_cast_member(&self.project, id, name, role, keywords, avatar_url)?;
        self.replace(next)
    }

    pub fn lock_cast_member(&mut self, id: EntityId) -> Result<(), SessionError> {
        let next = project::lock_cast_member(&self.project, id)?;
        self.replace(next)
    }

    pub fn set_lora_weights(
        &mut self,
        id: EntityId,
        model_name: impl Into<String>,
        strength: f64,
        trigger_word: impl Into<String>,
    ) -> Result<(), SessionError> {
        let next =
            project::set_lora_weights(&self.project, id, model_name, strength, trigger_word)?;
        self.replace(next)
    }

    // -- settings ------------------------------------------------------------

    pub fn update_settings(&mut self, settings: ProjectSettings) -> Result<(), SessionError> {
        let next = project::update_settings(&self.project, settings);
        self.replace(next)
    }

    // -- imports -------------------------------------------------------------

    /// Import a chat-log export: normalize, segment, replace the scene
    /// sequence, and retitle. Returns the number of scenes created.
    /// Any failure leaves the project untouched.
    pub fn import_chat_log(
        &mut self,
        raw: &str,
        source_name: &str,
    ) -> Result<usize, SessionError> {
        let messages = chatlog::normalize(raw)?;
        let scenes = segment::segment(&messages);
        let count = scenes.len();

        let mut next = project::replace_scenes(&self.project, scenes)?;
        next.title = format!("{} - Imported from {}", self.project.title, source_name);
        self.replace(next)?;
        self.active_scene = 0;

        tracing::info!(scenes = count, source = source_name, "chat log imported");
        Ok(count)
    }

    /// Load a `.forge` document, adopting it wholesale and resetting
    /// the cursor to the first scene.
    pub fn import_project(&mut self, raw: &str) -> Result<(), SessionError> {
        let loaded = document::import(raw)?;
        self.replace(loaded)?;
        self.active_scene = 0;
        Ok(())
    }

    // -- internal ------------------------------------------------------------

    /// Persist and adopt the next aggregate value, then clamp the
    /// cursor. Persist failure keeps the previous state.
    fn replace(&mut self, next: ProjectData) -> Result<(), SessionError> {
        self.store.save(&next)?;
        self.project = next;
        if self.active_scene >= self.project.scenes.len() {
            self.active_scene = self.project.scenes.len() - 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
