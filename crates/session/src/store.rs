//! Session persistence: the full project round-tripped to a local
//! key-value store under one fixed key on every mutation.
//!
//! Corrupt or unparseable stored data is logged and ignored, leaving
//! the built-in default project active.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use forge_core::ProjectData;

/// The single key the project lives under.
pub const SESSION_KEY: &str = "forge_project";

/// Errors while persisting session data.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write session data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed key-value store holding the active project.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// A store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backing file for the fixed session key.
    pub fn key_path(&self) -> PathBuf {
        self.dir.join(format!("{SESSION_KEY}.json"))
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the stored project, if any.
    ///
    /// A missing file is a clean `None` (fresh session). Unreadable or
    /// unparseable data is logged and treated the same way -- the
    /// caller falls back to the default project.
    pub fn load(&self) -> Option<ProjectData> {
        let path = self.key_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable session data, ignoring");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt session data, ignoring");
                None
            }
        }
    }

    /// Persist the project under the fixed key.
    pub fn save(&self, project: &ProjectData) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(project)?;
        std::fs::write(self.key_path(), raw)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut project = ProjectData::default();
        project.title = "Persisted".to_string();
        store.save(&project).unwrap();
        assert_eq!(store.load().unwrap(), project);
    }

    #[test]
    fn corrupt_data_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        std::fs::write(store.key_path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session"));
        store.save(&ProjectData::default()).unwrap();
        assert!(store.load().is_some());
    }
}
