//! Time-gap scene segmentation.
//!
//! Partitions a normalized message stream into scenes wherever the
//! elapsed time since the current scene's *start* (not the previous
//! message) exceeds two hours. The idle gap is a proxy for "the user
//! walked away and came back to a different narrative beat", a cheap
//! heuristic rather than semantic scene detection.

use crate::chatlog::Message;
use crate::project::{Scene, DEFAULT_MOOD};
use crate::types::{EntityId, TimestampMs};

/// Idle gap that closes a scene: two hours.
pub const SCENE_GAP_MS: TimestampMs = 2 * 60 * 60 * 1000;

/// Split a message stream into scenes by elapsed-time gaps.
///
/// Precondition: `messages` is sorted ascending by timestamp (the
/// normalizer guarantees this). An empty stream yields no scenes.
/// Scene ids are assigned 1..N in emission order.
pub fn segment(messages: &[Message]) -> Vec<Scene> {
    let mut scenes: Vec<Scene> = Vec::new();
    let Some(first) = messages.first() else {
        return scenes;
    };

    let mut buffer: Vec<&Message> = Vec::new();
    let mut scene_start = first.timestamp;

    for message in messages {
        // Strictly greater: a gap of exactly two hours stays in the
        // same scene.
        if message.timestamp - scene_start > SCENE_GAP_MS && !buffer.is_empty() {
            scenes.push(scene_from(&buffer, scenes.len() as EntityId + 1));
            buffer.clear();
            scene_start = message.timestamp;
        }
        buffer.push(message);
    }

    if !buffer.is_empty() {
        scenes.push(scene_from(&buffer, scenes.len() as EntityId + 1));
    }

    scenes
}

/// Close a buffer into a scene: `[ROLE]: content` lines separated by
/// blank lines, no characters, neutral mood, not approved.
fn scene_from(buffer: &[&Message], id: EntityId) -> Scene {
    let text = buffer
        .iter()
        .map(|m| format!("[{}]: {}", m.role.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    Scene {
        id,
        text,
        characters: Vec::new(),
        mood: DEFAULT_MOOD.to_string(),
        approved: false,
        image_url: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: TimestampMs = 60 * 60 * 1000;

    fn message(content: &str, timestamp: TimestampMs) -> Message {
        Message {
            role: "user".to_string(),
            content: content.to_string(),
            timestamp,
            original_index: 0,
        }
    }

    #[test]
    fn empty_stream_yields_no_scenes() {
        assert!(segment(&[]).is_empty());
    }

    #[test]
    fn single_message_yields_one_scene() {
        let scenes = segment(&[message("Hi", 0)]);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].id, 1);
        assert_eq!(scenes[0].text, "[USER]: Hi");
        assert_eq!(scenes[0].mood, DEFAULT_MOOD);
        assert!(!scenes[0].approved);
        assert!(scenes[0].characters.is_empty());
    }

    #[test]
    fn gap_of_exactly_two_hours_does_not_split() {
        let scenes = segment(&[message("A", 0), message("B", SCENE_GAP_MS)]);
        assert_eq!(scenes.len(), 1);
    }

    #[test]
    fn gap_of_two_hours_plus_one_ms_splits() {
        let scenes = segment(&[message("A", 0), message("B", SCENE_GAP_MS + 1)]);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].text, "[USER]: A");
        assert_eq!(scenes[1].text, "[USER]: B");
    }

    #[test]
    fn gap_is_measured_from_scene_start_not_previous_message() {
        // 0 -> 1h: within the gap. 1h -> 3h: the *pairwise* gap is
        // exactly 2h, but elapsed from scene start is 3h, so the scene
        // closes at the 3h message. 3h -> 3h05: same scene.
        let scenes = segment(&[
            message("A", 0),
            message("B", HOUR),
            message("C", 3 * HOUR),
            message("D", 3 * HOUR + 5 * 60 * 1000),
        ]);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].text, "[USER]: A\n\n[USER]: B");
        assert_eq!(scenes[1].text, "[USER]: C\n\n[USER]: D");
    }

    #[test]
    fn scene_ids_are_sequential_from_one() {
        let scenes = segment(&[
            message("A", 0),
            message("B", 3 * HOUR),
            message("C", 6 * HOUR),
        ]);
        assert_eq!(
            scenes.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn roles_are_uppercased_in_scene_text() {
        let mut a = message("Hi", 0);
        a.role = "assistant".to_string();
        let scenes = segment(&[a]);
        assert_eq!(scenes[0].text, "[ASSISTANT]: Hi");
    }
}
