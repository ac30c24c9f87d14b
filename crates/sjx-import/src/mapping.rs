//! Id mapping for tracked types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sjx_schema::EntityType;
use std::collections::BTreeMap;

/// `(entity type, original id) -> new id` for one import run
///
/// Only tracked types are recorded. Serialized as
/// `{"User": {"5": 2000000005}, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMapping {
    by_type: IndexMap<EntityType, BTreeMap<i64, i64>>,
}

impl IdMapping {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping; returns the previous new id, if any
    pub fn insert(&mut self, entity_type: &EntityType, original: i64, new: i64) -> Option<i64> {
        self.by_type
            .entry(entity_type.clone())
            .or_default()
            .insert(original, new)
    }

    /// New id of an original record
    #[inline]
    #[must_use]
    pub fn get(&self, entity_type: &str, original: i64) -> Option<i64> {
        self.by_type.get(entity_type)?.get(&original).copied()
    }

    /// All mappings of a type
    #[must_use]
    pub fn for_type(&self, entity_type: &str) -> Option<&BTreeMap<i64, i64>> {
        self.by_type.get(entity_type)
    }

    /// Number of mapped records across all types
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is mapped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
