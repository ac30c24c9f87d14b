//! Error types for record stores

use std::path::PathBuf;

/// Errors raised by [`SourceStore`](crate::SourceStore) and
/// [`TargetStore`](crate::TargetStore) implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Checked creation found a reference to a record that does not exist
    #[error("{entity_type}.{field} references missing {target} {id}")]
    MissingReference {
        /// Type of the record being created
        entity_type: String,
        /// Referencing field
        field: String,
        /// Referenced type
        target: String,
        /// Referenced id
        id: i64,
    },

    /// Polymorphic reference names a type the store does not know
    #[error("{entity_type}.{field} names unknown type '{target}'")]
    UnknownReferenceType {
        /// Type of the record being created
        entity_type: String,
        /// Discriminator field
        field: String,
        /// Named type
        target: String,
    },

    /// A record with the same id already exists
    #[error("duplicate id {id} for {entity_type}")]
    DuplicateId {
        /// Record type
        entity_type: String,
        /// Conflicting id
        id: i64,
    },

    /// Record id field holds a non-integer value
    #[error("{entity_type} record has a non-integer id")]
    InvalidId {
        /// Record type
        entity_type: String,
    },

    /// Snapshot file could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        /// Snapshot path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot content is not valid JSON of the expected shape
    #[error("snapshot format error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means a referenced record was absent
    #[inline]
    #[must_use]
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            Self::MissingReference { .. } | Self::UnknownReferenceType { .. }
        )
    }
}
