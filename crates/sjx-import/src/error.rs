//! Error types for import

use crate::report::UnresolvedReference;
use sjx_schema::SchemaError;
use sjx_store::StoreError;

/// Errors aborting an import run
///
/// Records created before the failure stay in the target store unless the
/// caller wrapped the run in a transaction.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The target store rejected a record whose referenced record is absent
    #[error("cannot create {description}: {source}")]
    MissingDependency {
        /// Type of the rejected record
        entity_type: String,
        /// Id of the record in the document
        original_id: i64,
        /// Human-readable record description
        description: String,
        /// Store rejection
        #[source]
        source: StoreError,
    },

    /// Strict mode found a reference the engine could not reassociate
    #[error("unresolved reference: {0}")]
    UnresolvedReference(UnresolvedReference),

    /// A record has no integer id
    #[error("{entity_type} record has no integer id")]
    RecordWithoutId {
        /// Record type
        entity_type: String,
    },

    /// Any other store failure
    #[error("failed to import {description}: {source}")]
    Store {
        /// Human-readable record description
        description: String,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Registered type missing from the schema
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ImportError {
    /// Whether the error is a missing referenced record
    #[inline]
    #[must_use]
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display() {
        let err = ImportError::MissingDependency {
            entity_type: "TaskTimer".to_string(),
            original_id: 3,
            description: "TaskTimer 3".to_string(),
            source: StoreError::MissingReference {
                entity_type: "TaskTimer".to_string(),
                field: "task_id".to_string(),
                target: "Task".to_string(),
                id: 2_000_000_001,
            },
        };
        assert_eq!(
            err.to_string(),
            "cannot create TaskTimer 3: TaskTimer.task_id references missing Task 2000000001"
        );
        assert!(err.is_missing_dependency());
    }
}
