//! Error types for document parsing

/// Malformed or unreadable export document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Not valid JSON
    #[error("document is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Top-level value is not an object
    #[error("document root must be a JSON object")]
    NotAnObject,

    /// No `metadata` entry
    #[error("document has no metadata")]
    MissingMetadata,

    /// `metadata` has the wrong shape
    #[error("invalid document metadata: {0}")]
    InvalidMetadata(String),

    /// Format version this build cannot read
    #[error("unsupported document format version {found} (expected {supported})")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Version this build reads
        supported: u32,
    },

    /// A type's entry is not an array
    #[error("{entity_type} entry must be an array, found {kind}")]
    NotAnArray {
        /// Entry key
        entity_type: String,
        /// JSON kind found
        kind: &'static str,
    },

    /// A record is not an object
    #[error("{entity_type}[{index}] must be an object, found {kind}")]
    RecordNotObject {
        /// Entry key
        entity_type: String,
        /// Position in the array
        index: usize,
        /// JSON kind found
        kind: &'static str,
    },

    /// A record lacks an integer `id`
    #[error("{entity_type}[{index}] has no integer id")]
    MissingId {
        /// Entry key
        entity_type: String,
        /// Position in the array
        index: usize,
    },

    /// Two records of a type share an id
    #[error("{entity_type} id {id} appears more than once")]
    DuplicateId {
        /// Entry key
        entity_type: String,
        /// Repeated id
        id: i64,
    },

    /// A top-level key appears more than once
    #[error("document entry {0} appears more than once")]
    DuplicateEntry(String),

    /// Serialization failed
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}
