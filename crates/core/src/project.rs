//! Project data model and pure mutation functions.
//!
//! [`ProjectData`] is the aggregate root owning all scenes, cast
//! members, and settings. Every mutation is expressed as "compute the
//! next value, then replace": the functions here never touch their
//! input, they return a fresh [`ProjectData`] (or an error and no
//! change). Callers are responsible for persisting the replacement.
//!
//! Invariants enforced at the mutation boundary:
//!
//! - `scenes` is never empty (deleting the last scene is refused).
//! - Scene and cast ids are unique; fresh ids are `max(existing, 0) + 1`
//!   and are never reused after deletion.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// One narrative unit: text, tagged characters, mood, and an optional
/// generated illustration.
///
/// `characters` holds free-text names, not cast ids. Matching against
/// the cast is a fuzzy, recomputed-at-use comparison (see
/// [`crate::prompt`]) so that nicknames and honorifics in messy source
/// transcripts still link up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: EntityId,
    pub text: String,
    pub characters: Vec<String>,
    pub mood: String,
    pub approved: bool,
    /// Data URI of the last generated illustration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A recurring character with identity-consistency metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub id: EntityId,
    pub name: String,
    /// Free text; the UI offers a fixed set but imports may carry
    /// anything (e.g. "Imported Model").
    pub role: String,
    /// True once the user has explicitly confirmed this member.
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Data URI avatar, if the character card carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_model_name: Option<String>,
    /// LoRA strength in `[0, 1]`, clamped when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_trigger_word: Option<String>,
    /// Comma-separated visual keywords, used verbatim in prompt
    /// synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// Generation settings shared by all remote calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Style instruction injected into every prompt.
    pub director_style: String,
    pub ollama_url: String,
    pub story_model: String,
    pub vision_model: String,
}

/// The aggregate root: title, ordered scenes, ordered cast, settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub title: String,
    pub scenes: Vec<Scene>,
    pub cast: Vec<CastMember>,
    pub settings: ProjectSettings,
}

/// Draft for a cast member about to be added; the id is assigned by
/// [`add_cast_member`].
#[derive(Debug, Clone, Default)]
pub struct CastMemberDraft {
    pub name: String,
    pub role: String,
    pub locked: bool,
    pub system_prompt: Option<String>,
    pub avatar_url: Option<String>,
    pub keywords: Option<String>,
}

/// Placeholder text for a freshly added scene.
pub const NEW_SCENE_TEXT: &str = "Enter scene description here...";

/// Default mood for scenes created by segmentation or "add scene".
pub const DEFAULT_MOOD: &str = "Neutral";

impl Scene {
    /// A blank scene with the given id: placeholder text, no
    /// characters, neutral mood, not approved.
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            text: NEW_SCENE_TEXT.to_string(),
            characters: Vec::new(),
            mood: DEFAULT_MOOD.to_string(),
            approved: false,
            image_url: None,
        }
    }
}

impl Default for ProjectData {
    /// The built-in demo project active until something is imported.
    fn default() -> Self {
        ProjectData {
            title: "The Forge Script".to_string(),
            scenes: vec![
                Scene {
                    id: 1,
                    text: "The neon lights flickered off the wet pavement as Commander Vex \
                           leaned across the cold metal table. Her cybernetic eye pulsed a \
                           deep crimson. \"You know what happens to people who lie to the \
                           Syndicate, don't you?\" The prisoner's breath caught in his throat."
                        .to_string(),
                    characters: vec!["Cmdr. Vex".to_string(), "Unknown Prisoner".to_string()],
                    mood: "Tension".to_string(),
                    approved: false,
                    image_url: None,
                },
                Scene {
                    id: 2,
                    text: "\"I told you everything I know!\" Marcus slammed his fists against \
                           the restraints. The holographic replay of the station breach \
                           flickered between them. Vex's smile was cold, calculating."
                        .to_string(),
                    characters: vec!["Cmdr. Vex".to_string(), "Marcus Cole".to_string()],
                    mood: "Desperation".to_string(),
                    approved: true,
                    image_url: None,
                },
                Scene {
                    id: 3,
                    text: "The door hissed open. Admiral Kira stepped through, her white \
                           uniform pristine against the grimy walls. \"Stand down, Commander. \
                           This one belongs to Division Nine now.\""
                        .to_string(),
                    characters: vec!["Admiral Kira".to_string(), "Cmdr. Vex".to_string()],
                    mood: "Power Shift".to_string(),
                    approved: true,
                    image_url: None,
                },
            ],
            cast: vec![
                CastMember {
                    id: 1,
                    name: "Elena Vex".to_string(),
                    role: "Protagonist".to_string(),
                    locked: false,
                    system_prompt: None,
                    avatar_url: None,
                    lora_model_name: None,
                    lora_strength: None,
                    lora_trigger_word: None,
                    keywords: Some(
                        "cybernetic eye glowing red, silver hair, stern expression, \
                         military uniform, scar across left eye"
                            .to_string(),
                    ),
                },
                CastMember {
                    id: 2,
                    name: "Marcus Cole".to_string(),
                    role: "Prisoner".to_string(),
                    locked: false,
                    system_prompt: None,
                    avatar_url: None,
                    lora_model_name: None,
                    lora_strength: None,
                    lora_trigger_word: None,
                    keywords: Some(
                        "disheveled appearance, restraints, desperate expression, \
                         worn clothing, anxious demeanor"
                            .to_string(),
                    ),
                },
                CastMember {
                    id: 3,
                    name: "Admiral Kira".to_string(),
                    role: "Antagonist".to_string(),
                    locked: false,
                    system_prompt: None,
                    avatar_url: None,
                    lora_model_name: None,
                    lora_strength: None,
                    lora_trigger_word: None,
                    keywords: Some(
                        "pristine white uniform, authority stance, cold demeanor, \
                         military insignia, commanding presence"
                            .to_string(),
                    ),
                },
            ],
            settings: ProjectSettings {
                director_style: "You are a cinematic director. Write scenes in a noir style, \
                                 focusing on lighting, atmosphere, and sensory details. Avoid \
                                 flowery language."
                    .to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                story_model: "dolphin-mistral:7b".to_string(),
                vision_model: "llava:latest".to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Next scene id: `max(existing, 0) + 1`.
pub fn next_scene_id(project: &ProjectData) -> EntityId {
    project.scenes.iter().map(|s| s.id).max().unwrap_or(0) + 1
}

/// Next cast member id: `max(existing, 0) + 1`.
pub fn next_cast_id(project: &ProjectData) -> EntityId {
    project.cast.iter().map(|m| m.id).max().unwrap_or(0) + 1
}

// ---------------------------------------------------------------------------
// Scene mutations
// ---------------------------------------------------------------------------

/// Append a blank scene with a freshly assigned id.
pub fn add_scene(project: &ProjectData) -> ProjectData {
    let mut next = project.clone();
    next.scenes.push(Scene::blank(next_scene_id(project)));
    next
}

/// Delete a scene by id.
///
/// Refused when it would leave the project with zero scenes; the
/// one-scene minimum is a hard invariant.
pub fn delete_scene(project: &ProjectData, id: EntityId) -> Result<ProjectData, CoreError> {
    scene_position(project, id)?;
    if project.scenes.len() <= 1 {
        return Err(CoreError::Validation(
            "cannot delete the last scene".to_string(),
        ));
    }
    let mut next = project.clone();
    next.scenes.retain(|s| s.id != id);
    Ok(next)
}

/// Replace a scene's text wholesale.
pub fn update_scene_text(
    project: &ProjectData,
    id: EntityId,
    text: impl Into<String>,
) -> Result<ProjectData, CoreError> {
    with_scene(project, id, |scene| scene.text = text.into())
}

/// Replace a scene's mood label.
pub fn update_scene_mood(
    project: &ProjectData,
    id: EntityId,
    mood: impl Into<String>,
) -> Result<ProjectData, CoreError> {
    with_scene(project, id, |scene| scene.mood = mood.into())
}

/// Set a scene's character list from a comma-separated string.
/// Entries are trimmed; empty entries are dropped.
pub fn set_scene_characters(
    project: &ProjectData,
    id: EntityId,
    characters: &str,
) -> Result<ProjectData, CoreError> {
    let parsed: Vec<String> = characters
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    with_scene(project, id, |scene| scene.characters = parsed)
}

/// Append clarifying context to a scene's text.
pub fn inject_context(
    project: &ProjectData,
    id: EntityId,
    context: &str,
) -> Result<ProjectData, CoreError> {
    if context.trim().is_empty() {
        return Err(CoreError::Validation("context is empty".to_string()));
    }
    with_scene(project, id, |scene| {
        scene.text.push_str(&format!("\n\n[Context Injected]: {context}"));
    })
}

/// Mark a scene approved.
pub fn approve_scene(project: &ProjectData, id: EntityId) -> Result<ProjectData, CoreError> {
    with_scene(project, id, |scene| scene.approved = true)
}

/// Attach a generated illustration (data URI) to a scene.
pub fn set_scene_image(
    project: &ProjectData,
    id: EntityId,
    data_uri: impl Into<String>,
) -> Result<ProjectData, CoreError> {
    with_scene(project, id, |scene| scene.image_url = Some(data_uri.into()))
}

/// Replace the whole scene sequence (chat-log import).
///
/// The replacement must itself be non-empty, preserving the one-scene
/// minimum.
pub fn replace_scenes(
    project: &ProjectData,
    scenes: Vec<Scene>,
) -> Result<ProjectData, CoreError> {
    if scenes.is_empty() {
        return Err(CoreError::Validation(
            "replacement scene list is empty".to_string(),
        ));
    }
    let mut next = project.clone();
    next.scenes = scenes;
    Ok(next)
}

// ---------------------------------------------------------------------------
// Cast mutations
// ---------------------------------------------------------------------------

/// Add a cast member from a draft, assigning a fresh id.
pub fn add_cast_member(project: &ProjectData, draft: CastMemberDraft) -> ProjectData {
    let mut next = project.clone();
    next.cast.push(CastMember {
        id: next_cast_id(project),
        name: draft.name,
        role: draft.role,
        locked: draft.locked,
        system_prompt: draft.system_prompt,
        avatar_url: draft.avatar_url,
        lora_model_name: None,
        lora_strength: None,
        lora_trigger_word: None,
        keywords: draft.keywords,
    });
    next
}

/// Remove a cast member by id. Scenes are untouched; their character
/// lists are free text, not references.
pub fn remove_cast_member(project: &ProjectData, id: EntityId) -> Result<ProjectData, CoreError> {
    cast_position(project, id)?;
    let mut next = project.clone();
    next.cast.retain(|m| m.id != id);
    Ok(next)
}

/// Edit a cast member's identity fields.
pub fn update_cast_member(
    project: &ProjectData,
    id: EntityId,
    name: impl Into<String>,
    role: impl Into<String>,
    keywords: Option<String>,
    avatar_url: Option<String>,
) -> Result<ProjectData, CoreError> {
    with_cast_member(project, id, |member| {
        member.name = name.into();
        member.role = role.into();
        member.keywords = keywords.filter(|k| !k.trim().is_empty());
        member.avatar_url = avatar_url.filter(|a| !a.trim().is_empty());
    })
}

/// Lock a cast member (explicit user confirmation).
pub fn lock_cast_member(project: &ProjectData, id: EntityId) -> Result<ProjectData, CoreError> {
    with_cast_member(project, id, |member| member.locked = true)
}

/// Attach LoRA weights to a cast member. Strength is clamped into
/// `[0, 1]`.
pub fn set_lora_weights(
    project: &ProjectData,
    id: EntityId,
    model_name: impl Into<String>,
    strength: f64,
    trigger_word: impl Into<String>,
) -> Result<ProjectData, CoreError> {
    let model_name = model_name.into();
    let trigger_word = trigger_word.into();
    with_cast_member(project, id, |member| {
        member.lora_model_name = Some(model_name).filter(|m| !m.trim().is_empty());
        member.lora_strength = Some(strength.clamp(0.0, 1.0));
        member.lora_trigger_word = Some(trigger_word).filter(|t| !t.trim().is_empty());
    })
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Replace the generation settings.
pub fn update_settings(project: &ProjectData, settings: ProjectSettings) -> ProjectData {
    let mut next = project.clone();
    next.settings = settings;
    next
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Index of a scene within the project, by id.
pub fn scene_position(project: &ProjectData, id: EntityId) -> Result<usize, CoreError> {
    project
        .scenes
        .iter()
        .position(|s| s.id == id)
        .ok_or(CoreError::NotFound { entity: "scene", id })
}

fn cast_position(project: &ProjectData, id: EntityId) -> Result<usize, CoreError> {
    project
        .cast
        .iter()
        .position(|m| m.id == id)
        .ok_or(CoreError::NotFound { entity: "cast member", id })
}

fn with_scene(
    project: &ProjectData,
    id: EntityId,
    edit: impl FnOnce(&mut Scene),
) -> Result<ProjectData, CoreError> {
    let index = scene_position(project, id)?;
    let mut next = project.clone();
    edit(&mut next.scenes[index]);
    Ok(next)
}

fn with_cast_member(
    project: &ProjectData,
    id: EntityId,
    edit: impl FnOnce(&mut CastMember),
) -> Result<ProjectData, CoreError> {
    let index = cast_position(project, id)?;
    let mut next = project.clone();
    edit(&mut next.cast[index]);
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn one_scene_project() -> ProjectData {
        let mut project = ProjectData::default();
        project.scenes.truncate(1);
        project
    }

    // -- id generation -------------------------------------------------------

    #[test]
    fn next_scene_id_is_max_plus_one() {
        let project = ProjectData::default();
        assert_eq!(next_scene_id(&project), 4);
    }

    #[test]
    fn ids_are_not_reused_after_deletion() {
        let project = ProjectData::default();
        let project = delete_scene(&project, 3).unwrap();
        // Highest surviving id is 2, but 3 was used before.
        let project = add_scene(&project);
        assert_eq!(project.scenes.last().unwrap().id, 3);

        // Delete a middle scene instead: max stays 3, next is 4.
        let project = ProjectData::default();
        let project = delete_scene(&project, 2).unwrap();
        let project = add_scene(&project);
        assert_eq!(project.scenes.last().unwrap().id, 4);
    }

    // -- scene deletion ------------------------------------------------------

    #[test]
    fn delete_scene_removes_by_id() {
        let project = ProjectData::default();
        let next = delete_scene(&project, 2).unwrap();
        assert_eq!(next.scenes.len(), 2);
        assert!(next.scenes.iter().all(|s| s.id != 2));
        // Input is untouched.
        assert_eq!(project.scenes.len(), 3);
    }

    #[test]
    fn refuses_to_delete_the_last_scene() {
        let project = one_scene_project();
        assert_matches!(
            delete_scene(&project, project.scenes[0].id),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn delete_unknown_scene_is_not_found() {
        let project = ProjectData::default();
        assert_matches!(delete_scene(&project, 99), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn delete_unknown_scene_is_not_found_even_with_one_scene_left() {
        let project = one_scene_project();
        assert_matches!(delete_scene(&project, 99), Err(CoreError::NotFound { .. }));
    }

    // -- scene edits ---------------------------------------------------------

    #[test]
    fn update_scene_text_replaces_text() {
        let project = ProjectData::default();
        let next = update_scene_text(&project, 1, "New text").unwrap();
        assert_eq!(next.scenes[0].text, "New text");
        assert_ne!(project.scenes[0].text, "New text");
    }

    #[test]
    fn set_scene_characters_parses_comma_list() {
        let project = ProjectData::default();
        let next = set_scene_characters(&project, 1, " Vex ,  Marcus Cole ,, ").unwrap();
        assert_eq!(next.scenes[0].characters, vec!["Vex", "Marcus Cole"]);
    }

    #[test]
    fn inject_context_appends_tagged_block() {
        let project = ProjectData::default();
        let next = inject_context(&project, 1, "The interrogation room").unwrap();
        assert!(next.scenes[0]
            .text
            .ends_with("\n\n[Context Injected]: The interrogation room"));
    }

    #[test]
    fn inject_empty_context_is_refused() {
        let project = ProjectData::default();
        assert_matches!(
            inject_context(&project, 1, "   "),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn approve_scene_sets_flag() {
        let project = ProjectData::default();
        let next = approve_scene(&project, 1).unwrap();
        assert!(next.scenes[0].approved);
    }

    #[test]
    fn set_scene_image_stores_data_uri() {
        let project = ProjectData::default();
        let next = set_scene_image(&project, 1, "data:image/png;base64,AAAA").unwrap();
        assert_eq!(
            next.scenes[0].image_url.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn replace_scenes_rejects_empty_list() {
        let project = ProjectData::default();
        assert_matches!(
            replace_scenes(&project, Vec::new()),
            Err(CoreError::Validation(_))
        );
    }

    // -- cast ----------------------------------------------------------------

    #[test]
    fn add_cast_member_assigns_fresh_id() {
        let project = ProjectData::default();
        let next = add_cast_member(
            &project,
            CastMemberDraft {
                name: "Nyx".to_string(),
                role: "Support".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(next.cast.len(), 4);
        assert_eq!(next.cast[3].id, 4);
        assert!(!next.cast[3].locked);
    }

    #[test]
    fn remove_cast_member_leaves_scenes_alone() {
        let project = ProjectData::default();
        let next = remove_cast_member(&project, 1).unwrap();
        assert_eq!(next.cast.len(), 2);
        assert_eq!(next.scenes, project.scenes);
    }

    #[test]
    fn lora_strength_is_clamped() {
        let project = ProjectData::default();
        let next = set_lora_weights(&project, 1, "vex-v2", 1.7, "vex").unwrap();
        assert_eq!(next.cast[0].lora_strength, Some(1.0));
        let next = set_lora_weights(&project, 1, "vex-v2", -0.3, "vex").unwrap();
        assert_eq!(next.cast[0].lora_strength, Some(0.0));
    }

    #[test]
    fn lock_cast_member_sets_flag() {
        let project = ProjectData::default();
        let next = lock_cast_member(&project, 2).unwrap();
        assert!(next.cast[1].locked);
    }

    // -- default project -----------------------------------------------------

    #[test]
    fn default_project_satisfies_invariants() {
        let project = ProjectData::default();
        assert!(!project.scenes.is_empty());
        let mut scene_ids: Vec<_> = project.scenes.iter().map(|s| s.id).collect();
        scene_ids.dedup();
        assert_eq!(scene_ids.len(), project.scenes.len());
        let mut cast_ids: Vec<_> = project.cast.iter().map(|m| m.id).collect();
        cast_ids.dedup();
        assert_eq!(cast_ids.len(), project.cast.len());
    }
}
