//! Import outcome

use crate::mapping::IdMapping;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sjx_schema::EntityType;
use std::fmt;

/// An integer `_id` field still below the id offset after re-association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Type of the imported record
    pub entity_type: EntityType,
    /// Id of the record in the document
    pub original_id: i64,
    /// Offending field
    pub field: String,
    /// Value left in the field
    pub value: i64,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} = {} was not reassociated",
            self.entity_type, self.original_id, self.field, self.value
        )
    }
}

/// Summary of one import run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Records created, per type
    pub created: IndexMap<EntityType, usize>,
    /// Records matched to existing target records instead of created, per type
    pub reused: IndexMap<EntityType, usize>,
    /// Document types with no registry entry, ignored
    pub skipped_types: Vec<EntityType>,
    /// References the validation pass could not confirm
    pub warnings: Vec<UnresolvedReference>,
    /// Original to new ids of tracked types
    pub id_mapping: IdMapping,
}

impl ImportReport {
    /// Created count of a type
    #[must_use]
    pub fn created_count(&self, entity_type: &str) -> usize {
        self.created.get(entity_type).copied().unwrap_or(0)
    }

    /// Reused count of a type
    #[must_use]
    pub fn reused_count(&self, entity_type: &str) -> usize {
        self.reused.get(entity_type).copied().unwrap_or(0)
    }

    /// Total records created
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }

    /// Total records reused
    #[must_use]
    pub fn total_reused(&self) -> usize {
        self.reused.values().sum()
    }

    /// Whether the run finished without warnings
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn count_created(&mut self, entity_type: &EntityType) {
        *self.created.entry(entity_type.clone()).or_default() += 1;
    }

    pub(crate) fn count_reused(&mut self, entity_type: &EntityType) {
        *self.reused.entry(entity_type.clone()).or_default() += 1;
    }
}
