/// Scene and cast member ids: positive integers, unique within a
/// project, never reused after deletion.
pub type EntityId = i64;

/// Message timestamps are milliseconds since the Unix epoch.
pub type TimestampMs = i64;
