//! Character-card import: mapping an exported character definition
//! (Open WebUI card JSON) onto a cast member draft.

use serde_json::Value;

use crate::error::CoreError;
use crate::project::CastMemberDraft;

/// Name used when a card carries none.
pub const UNKNOWN_CHARACTER: &str = "Unknown Character";

/// Role assigned to imported cards that carry none.
pub const IMPORTED_ROLE: &str = "Imported Model";

/// A character card parsed out of an export file.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCard {
    pub name: String,
    pub role: String,
    pub system_prompt: Option<String>,
    /// Data URI avatar, when the card embeds one.
    pub avatar_url: Option<String>,
}

impl CharacterCard {
    /// True when the card embeds a base64 avatar image that could be
    /// fed to the vision tagger.
    pub fn has_data_uri_avatar(&self) -> bool {
        self.avatar_url
            .as_deref()
            .is_some_and(|url| url.starts_with("data:image"))
    }

    /// Build a cast member draft from the card. `keywords` is the
    /// vision-scan result when one succeeded; otherwise the draft gets
    /// the generic fallback for this name.
    pub fn into_draft(self, keywords: Option<String>) -> CastMemberDraft {
        let keywords = keywords
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| default_keywords(&self.name));
        CastMemberDraft {
            name: self.name,
            role: self.role,
            locked: false,
            system_prompt: self.system_prompt,
            avatar_url: self.avatar_url,
            keywords: Some(keywords),
        }
    }
}

/// Generic visual keywords for a character with no scanned avatar.
pub fn default_keywords(name: &str) -> String {
    format!("{name} appearance, character design, distinctive features")
}

/// Parse a character card export.
///
/// A bulk export (array of cards) uses element 0. Field fallbacks
/// follow the Open WebUI card layout: `params.system` before
/// `system_prompt`, `meta.profile_image_url` before `avatar`.
pub fn parse_character_card(raw: &str) -> Result<CharacterCard, CoreError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CoreError::Parse(e.to_string()))?;

    let card = match value.as_array() {
        Some(items) => items
            .first()
            .ok_or_else(|| CoreError::Format("character export is an empty array".to_string()))?,
        None => &value,
    };
    if !card.is_object() {
        return Err(CoreError::Format(
            "character export is not an object".to_string(),
        ));
    }

    let name = card
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_CHARACTER)
        .to_string();
    let role = card
        .get("role")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(IMPORTED_ROLE)
        .to_string();
    let system_prompt = card
        .pointer("/params/system")
        .and_then(Value::as_str)
        .or_else(|| card.get("system_prompt").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(String::from);
    let avatar_url = card
        .pointer("/meta/profile_image_url")
        .and_then(Value::as_str)
        .or_else(|| card.get("avatar").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(CharacterCard {
        name,
        role,
        system_prompt,
        avatar_url,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
