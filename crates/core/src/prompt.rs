//! Deterministic image-prompt synthesis.
//!
//! [`build_prompt`] is a pure function of `(scene, cast, director
//! style)`. Cast members are linked to a scene by fuzzy name matching:
//! case-insensitive, bidirectional substring, so "Vex" tags
//! "Commander Vex" and vice versa. There is deliberately no foreign
//! key between scenes and cast; transcripts name characters
//! inconsistently and the tolerance is the point.

use crate::project::{CastMember, Scene};

/// Sentence terminators for the visual summary split.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Number of leading sentences used as the scene's visual summary.
const SUMMARY_SENTENCES: usize = 2;

/// Build a single-line diffusion prompt from scene and cast state.
///
/// Assembles, pipe-joined and in fixed order, omitting empty segments:
/// director style, scene composition (first two sentences), mood,
/// characters present, and the matched cast members' visual details.
/// Output has no length cap; callers truncate to their model's limits.
pub fn build_prompt(scene: &Scene, cast: &[CastMember], director_style: &str) -> String {
    let visual_details = cast
        .iter()
        .filter(|member| member_in_scene(member, &scene.characters))
        .map(descriptor)
        .collect::<Vec<_>>()
        .join(" | ");

    let summary = visual_summary(&scene.text);

    let mut segments: Vec<String> = Vec::new();
    if !director_style.trim().is_empty() {
        segments.push(director_style.to_string());
    }
    if !summary.is_empty() {
        segments.push(format!("Scene composition: {summary}"));
    }
    if !scene.mood.trim().is_empty() {
        segments.push(format!("Mood: {}", scene.mood));
    }
    if !scene.characters.is_empty() {
        segments.push(format!(
            "Characters present: {}",
            scene.characters.join(", ")
        ));
    }
    if !visual_details.is_empty() {
        segments.push(format!("Visual details: {visual_details}"));
    }

    segments.join(" | ")
}

/// True when the member's name matches any scene character tag:
/// case-insensitive, substring in either direction (tolerates
/// nicknames and honorifics on either side).
pub fn member_in_scene(member: &CastMember, characters: &[String]) -> bool {
    let name = member.name.to_lowercase();
    characters.iter().any(|tag| {
        let tag = tag.to_lowercase();
        name.contains(&tag) || tag.contains(&name)
    })
}

/// A member's prompt descriptor: their keywords verbatim, or
/// `"{name} ({role})"` when none are set.
fn descriptor(member: &CastMember) -> String {
    match member.keywords.as_deref() {
        Some(keywords) if !keywords.trim().is_empty() => keywords.to_string(),
        _ => format!("{} ({})", member.name, member.role),
    }
}

/// First two sentences of the scene text, terminator-split, joined by
/// `". "`.
fn visual_summary(text: &str) -> String {
    text.split(&SENTENCE_TERMINATORS[..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(". ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
