//! Error types for schema and record handling

/// Errors from schema declaration and record construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Entity type is not declared in the schema
    #[error("unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// Entity type declared twice
    #[error("entity type declared twice: '{0}'")]
    DuplicateEntityType(String),

    /// Record value is not a JSON object
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(String),
}
