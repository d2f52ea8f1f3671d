//! The `.forge` project document: export/import contract.
//!
//! A project document is the UTF-8 JSON round-trip format: the full
//! aggregate plus an `exportedAt` stamp. Import adopts the loaded
//! document wholesale; there is no field-level merge with the
//! previous project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::project::{CastMember, ProjectData, ProjectSettings, Scene};

/// Default title when an imported document carries none.
pub const DEFAULT_IMPORT_TITLE: &str = "Loaded Project";

/// The persisted `.forge` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub title: String,
    pub scenes: Vec<Scene>,
    pub cast: Vec<CastMember>,
    pub settings: ProjectSettings,
    pub exported_at: DateTime<Utc>,
}

/// Snapshot a project into an export document stamped "now".
pub fn export(project: &ProjectData) -> ProjectDocument {
    export_at(project, Utc::now())
}

/// [`export`] with an explicit stamp, for deterministic tests.
pub fn export_at(project: &ProjectData, exported_at: DateTime<Utc>) -> ProjectDocument {
    ProjectDocument {
        title: project.title.clone(),
        scenes: project.scenes.clone(),
        cast: project.cast.clone(),
        settings: project.settings.clone(),
        exported_at,
    }
}

/// Serialize an export document to pretty-printed JSON.
pub fn to_json(document: &ProjectDocument) -> Result<String, CoreError> {
    serde_json::to_string_pretty(document).map_err(|e| CoreError::Parse(e.to_string()))
}

/// Import a `.forge` document.
///
/// `scenes`, `cast`, and `settings` are required; anything else is
/// optional with defaults (`title` falls back to
/// [`DEFAULT_IMPORT_TITLE`]). Fails with [`CoreError::Parse`] on
/// malformed JSON and [`CoreError::InvalidProject`] on missing or
/// malformed required fields.
pub fn import(raw: &str) -> Result<ProjectData, CoreError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CoreError::Parse(e.to_string()))?;

    for field in ["scenes", "cast", "settings"] {
        if value.get(field).is_none() {
            return Err(CoreError::InvalidProject(format!(
                "missing required field `{field}`"
            )));
        }
    }

    let scenes: Vec<Scene> = field_from_value(&value, "scenes")?;
    if scenes.is_empty() {
        return Err(CoreError::InvalidProject(
            "document contains no scenes".to_string(),
        ));
    }
    let cast: Vec<CastMember> = field_from_value(&value, "cast")?;
    let settings: ProjectSettings = field_from_value(&value, "settings")?;

    let title = value
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_IMPORT_TITLE)
        .to_string();

    Ok(ProjectData {
        title,
        scenes,
        cast,
        settings,
    })
}

fn field_from_value<T: serde::de::DeserializeOwned>(
    value: &Value,
    field: &str,
) -> Result<T, CoreError> {
    serde_json::from_value(value[field].clone())
        .map_err(|e| CoreError::InvalidProject(format!("field `{field}`: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn round_trip_preserves_the_project() {
        let project = ProjectData::default();
        let json = to_json(&export(&project)).unwrap();
        let loaded = import(&json).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn round_trip_preserves_optional_fields() {
        let mut project = ProjectData::default();
        project.scenes[0].image_url = Some("data:image/png;base64,AAAA".to_string());
        project.cast[0].lora_model_name = Some("vex-v2".to_string());
        project.cast[0].lora_strength = Some(0.7);
        let json = to_json(&export(&project)).unwrap();
        assert_eq!(import(&json).unwrap(), project);
    }

    #[test]
    fn export_stamp_is_carried_in_the_document() {
        let project = ProjectData::default();
        let when = "2024-03-01T10:00:00Z".parse().unwrap();
        let document = export_at(&project, when);
        let json = to_json(&document).unwrap();
        assert!(json.contains("\"exportedAt\""));
        assert_eq!(document.exported_at, when);
    }

    #[test]
    fn missing_scenes_is_rejected() {
        let raw = r#"{"cast": [], "settings": {"directorStyle": "", "ollamaUrl": "",
                      "storyModel": "", "visionModel": ""}}"#;
        assert_matches!(import(raw), Err(CoreError::InvalidProject(_)));
    }

    #[test]
    fn missing_cast_is_rejected() {
        let raw = r#"{"scenes": [], "settings": {"directorStyle": "", "ollamaUrl": "",
                      "storyModel": "", "visionModel": ""}}"#;
        assert_matches!(import(raw), Err(CoreError::InvalidProject(_)));
    }

    #[test]
    fn missing_settings_is_rejected() {
        let raw = r#"{"scenes": [], "cast": []}"#;
        assert_matches!(import(raw), Err(CoreError::InvalidProject(_)));
    }

    #[test]
    fn empty_scene_list_is_rejected() {
        let raw = r#"{"scenes": [], "cast": [], "settings": {"directorStyle": "",
                      "ollamaUrl": "", "storyModel": "", "visionModel": ""}}"#;
        assert_matches!(import(raw), Err(CoreError::InvalidProject(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert_matches!(import("{not json"), Err(CoreError::Parse(_)));
    }

    #[test]
    fn title_defaults_when_absent() {
        let project = ProjectData::default();
        let mut document = serde_json::to_value(export(&project)).unwrap();
        document.as_object_mut().unwrap().remove("title");
        let loaded = import(&document.to_string()).unwrap();
        assert_eq!(loaded.title, DEFAULT_IMPORT_TITLE);
    }

    #[test]
    fn exported_at_is_not_required_on_import() {
        let project = ProjectData::default();
        let mut document = serde_json::to_value(export(&project)).unwrap();
        document.as_object_mut().unwrap().remove("exportedAt");
        assert!(import(&document.to_string()).is_ok());
    }
}
