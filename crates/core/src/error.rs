use crate::types::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input to a parser was not valid JSON at all.
    #[error("Malformed JSON: {0}")]
    Parse(String),

    /// Valid JSON, but no recognizable message collection (or nothing
    /// usable survived filtering).
    #[error("Unrecognized chat log: {0}")]
    Format(String),

    /// A `.forge` project document is missing required top-level fields.
    #[error("Invalid project format: {0}")]
    InvalidProject(String),

    /// A mutation would break a project invariant.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },
}
