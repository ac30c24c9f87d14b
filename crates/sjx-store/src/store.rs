//! Store traits
//!
//! The exporter reads through [`SourceStore`]; the importer writes through
//! [`TargetStore`]. Both are synchronous: export and import are offline,
//! single-connection batch operations.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sjx_schema::{EntityType, Record};

/// How a record is created on import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationMode {
    /// Normal path: validate references, then run create callbacks
    #[default]
    Checked,
    /// Low-level path: no validation, no callbacks
    Raw,
}

/// Read access used by retrieval rules during export
pub trait SourceStore {
    /// Find a record by id
    ///
    /// # Errors
    /// Backend failures only; an absent record is `Ok(None)`
    fn find(&self, entity_type: &str, id: i64) -> Result<Option<Record>, StoreError>;

    /// Records whose `field` equals any of `values`, in store order
    ///
    /// # Errors
    /// Backend failures only
    fn where_in(
        &self,
        entity_type: &str,
        field: &str,
        values: &[Value],
    ) -> Result<Vec<Record>, StoreError>;

    /// Find many records by id, skipping absent ones
    ///
    /// # Errors
    /// Backend failures only
    fn find_all(&self, entity_type: &str, ids: &[i64]) -> Result<Vec<Record>, StoreError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.find(entity_type, *id)? {
                found.push(record);
            }
        }
        Ok(found)
    }
}

/// Write access used by the re-association engine during import
pub trait TargetStore {
    /// First record matching every `(field, value)` pair
    ///
    /// # Errors
    /// Backend failures only
    fn find_by(
        &self,
        entity_type: &str,
        criteria: &[(&str, &Value)],
    ) -> Result<Option<Record>, StoreError>;

    /// Create a record, returning its id
    ///
    /// Records carrying an `id` keep it; others get a store-assigned id.
    ///
    /// # Errors
    /// - [`StoreError::MissingReference`] when `Checked` finds a dangling reference
    /// - [`StoreError::DuplicateId`] when the id is taken
    fn create(
        &mut self,
        entity_type: &EntityType,
        record: Record,
        mode: CreationMode,
    ) -> Result<i64, StoreError>;
}

/// Loose equality used for field matching: integers compare numerically
#[must_use]
pub fn values_match(a: &Value, b: &Value) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
