//! Chat-log ingestion and normalization.
//!
//! Exported AI chat transcripts come in several incompatible schemas
//! (Open WebUI bulk exports, single-chat exports, bare `messages`
//! arrays, id-keyed history maps). [`normalize`] detects the shape,
//! flattens it to a canonical [`Message`] stream, and guarantees the
//! stream is sorted ascending by timestamp with the original relative
//! order preserved for ties.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::TimestampMs;

/// Spacing between synthesized timestamps when a message carries none.
/// Restores a deterministic relative order, not real wall-clock time.
pub const SYNTHETIC_STEP_MS: TimestampMs = 60_000;

/// A normalized chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    /// Non-empty after trimming; empty messages are dropped upstream.
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: TimestampMs,
    /// Position in the source collection; stable tie-break for equal
    /// timestamps.
    pub original_index: usize,
}

/// Normalize a raw chat-log export into an ordered message stream.
///
/// Fails with [`CoreError::Parse`] on invalid JSON, and with
/// [`CoreError::Format`] when no message collection is recognized or
/// when filtering empty content leaves nothing.
pub fn normalize(raw: &str) -> Result<Vec<Message>, CoreError> {
    normalize_at(raw, Utc::now().timestamp_millis())
}

/// [`normalize`] with an explicit "now" used as the anchor for
/// synthesized timestamps. Kept separate so tests are deterministic.
pub fn normalize_at(raw: &str, now_ms: TimestampMs) -> Result<Vec<Message>, CoreError> {
    let data: Value = serde_json::from_str(raw).map_err(|e| CoreError::Parse(e.to_string()))?;

    let raw_messages = locate_messages(&data)
        .ok_or_else(|| CoreError::Format("no message collection found".to_string()))?;
    let total = raw_messages.len();

    let mut messages: Vec<Message> = raw_messages
        .iter()
        .enumerate()
        .filter_map(|(index, msg)| {
            let content = string_field(msg, &["content", "message", "text"]).unwrap_or_default();
            if content.trim().is_empty() {
                return None;
            }
            let role =
                string_field(msg, &["role", "author"]).unwrap_or_else(|| "user".to_string());
            // Walk backward from "now" in 60s decrements when no
            // timestamp field exists, so array position still yields a
            // stable relative order.
            let timestamp = explicit_timestamp(msg)
                .unwrap_or_else(|| now_ms - (total - index) as i64 * SYNTHETIC_STEP_MS);
            Some(Message {
                role,
                content,
                timestamp,
                original_index: index,
            })
        })
        .collect();

    if messages.is_empty() {
        return Err(CoreError::Format(
            "no messages with content after filtering".to_string(),
        ));
    }

    messages.sort_by_key(|m| (m.timestamp, m.original_index));
    Ok(messages)
}

// ---------------------------------------------------------------------------
// Shape detection
// ---------------------------------------------------------------------------

/// Locate the message collection inside an arbitrary export, trying the
/// known shapes in order:
///
/// 1. Bulk multi-chat export: top-level array whose first element has
///    `chat.history.messages` (only element 0 is used).
/// 2. Top-level `messages` array.
/// 3. `history.messages` array.
/// 4. `history.messages` id-keyed map, else `history` itself as a map
///    or message array.
/// 5. Top-level `chat.history.messages` array or map.
///
/// Map values are taken order-independently; callers resolve order by
/// timestamp afterward.
fn locate_messages(data: &Value) -> Option<Vec<Value>> {
    if let Some(items) = data.as_array() {
        // A top-level array is only meaningful as a bulk export.
        let first = items.first()?;
        return first
            .pointer("/chat/history/messages")
            .and_then(collection_values);
    }

    if let Some(messages) = data.get("messages").and_then(Value::as_array) {
        return Some(messages.clone());
    }

    if let Some(history) = data.get("history") {
        if let Some(messages) = history.get("messages") {
            if let Some(values) = collection_values(messages) {
                return Some(values);
            }
        }
        if let Some(map) = history.as_object() {
            return Some(object_values(map));
        }
        if let Some(items) = history.as_array() {
            return Some(items.iter().filter(|v| v.is_object()).cloned().collect());
        }
    }

    if let Some(messages) = data.pointer("/chat/history/messages") {
        return collection_values(messages);
    }

    None
}

fn collection_values(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => Some(object_values(map)),
        _ => None,
    }
}

/// Values of an id-keyed message map, dropping anything that is not an
/// object.
fn object_values(map: &serde_json::Map<String, Value>) -> Vec<Value> {
    map.values().filter(|v| v.is_object()).cloned().collect()
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// First present string value among the given keys.
fn string_field(msg: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| msg.get(*key).and_then(Value::as_str))
        .map(String::from)
}

/// Explicit timestamp from `timestamp` / `created_at` / `date`.
///
/// String values parse as ISO-8601 (with or without an offset; no
/// locale-dependent formats). Numeric values are Unix seconds and are
/// scaled to milliseconds.
fn explicit_timestamp(msg: &Value) -> Option<TimestampMs> {
    for key in ["timestamp", "created_at", "date"] {
        match msg.get(key) {
            Some(Value::String(s)) => {
                if let Some(ms) = parse_iso_millis(s) {
                    return Some(ms);
                }
            }
            Some(Value::Number(n)) => {
                if let Some(seconds) = n.as_f64() {
                    return Some((seconds * 1000.0) as TimestampMs);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_iso_millis(s: &str) -> Option<TimestampMs> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    // Offset-less exports ("2024-03-01T10:00:00") are treated as UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
