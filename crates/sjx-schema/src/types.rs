//! Core record types
//!
//! Provides [`EntityType`], [`Record`] and [`RecordSet`], the shapes every
//! other SJX crate passes around.

use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Field map of a single record
pub type FieldMap = serde_json::Map<String, Value>;

/// Name of a persisted record kind (e.g. `Appeal`, `Task`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Create entity type from name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for EntityType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A single record: a JSON field map carrying an integer `id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(FieldMap);

impl Record {
    /// Create record from field map
    #[inline]
    #[must_use]
    pub fn new(fields: FieldMap) -> Self {
        Self(fields)
    }

    /// Create record from a JSON value
    ///
    /// # Errors
    /// Returns [`SchemaError::NotAnObject`] if the value is not a JSON object
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(SchemaError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Record id, if present and integral
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Integer field value
    #[inline]
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// String field value
    #[inline]
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Set field value, returning the previous one
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove field
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Borrow field map
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    /// Mutably borrow field map
    #[inline]
    pub fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.0
    }

    /// Consume into field map
    #[inline]
    #[must_use]
    pub fn into_fields(self) -> FieldMap {
        self.0
    }

    /// Short human-readable description, e.g. `Task 12 (RootTask)`
    #[must_use]
    pub fn describe(&self, entity_type: &EntityType) -> String {
        let id = self
            .id()
            .map_or_else(|| "<no id>".to_string(), |id| id.to_string());
        match self.get_str("type") {
            Some(sti) if sti != entity_type.as_str() => format!("{entity_type} {id} ({sti})"),
            _ => format!("{entity_type} {id}"),
        }
    }
}

impl TryFrom<Value> for Record {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Ordered mapping from entity type to its ordered records
///
/// Type order is insertion order; record order within a type is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: IndexMap<EntityType, Vec<Record>>,
}

impl RecordSet {
    /// Create empty record set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace records of a type
    pub fn insert(&mut self, entity_type: EntityType, records: Vec<Record>) {
        self.records.insert(entity_type, records);
    }

    /// Append records of a type, skipping ids already present
    ///
    /// Returns the number of records actually added.
    pub fn extend_unique(
        &mut self,
        entity_type: &EntityType,
        records: impl IntoIterator<Item = Record>,
    ) -> usize {
        let existing = self.records.entry(entity_type.clone()).or_default();
        let mut seen: HashSet<i64> = existing.iter().filter_map(Record::id).collect();
        let before = existing.len();
        existing.extend(
            records
                .into_iter()
                .filter(|record| record.id().map_or(true, |id| seen.insert(id))),
        );
        existing.len() - before
    }

    /// Records of a type (empty if the type was never collected)
    #[must_use]
    pub fn get(&self, entity_type: &str) -> &[Record] {
        self.records
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ids of a type's records, in order
    #[must_use]
    pub fn ids(&self, entity_type: &str) -> Vec<i64> {
        self.get(entity_type).iter().filter_map(Record::id).collect()
    }

    /// Find a record of a type by id
    #[must_use]
    pub fn find(&self, entity_type: &str, id: i64) -> Option<&Record> {
        self.get(entity_type).iter().find(|r| r.id() == Some(id))
    }

    /// Whether the type has an entry (possibly empty)
    #[inline]
    #[must_use]
    pub fn contains_type(&self, entity_type: &str) -> bool {
        self.records.contains_key(entity_type)
    }

    /// Entity types in order
    pub fn types(&self) -> impl Iterator<Item = &EntityType> {
        self.records.keys()
    }

    /// Iterate `(type, records)` in order
    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &[Record])> {
        self.records.iter().map(|(t, r)| (t, r.as_slice()))
    }

    /// Per-type record counts
    #[must_use]
    pub fn counts(&self) -> IndexMap<EntityType, usize> {
        self.records
            .iter()
            .map(|(t, r)| (t.clone(), r.len()))
            .collect()
    }

    /// Total number of records
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Whether no records are held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<(EntityType, Vec<Record>)> for RecordSet {
    fn from_iter<I: IntoIterator<Item = (EntityType, Vec<Record>)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Name of a JSON value's kind, for error messages
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn record_accessors() {
        let r = record(json!({"id": 7, "type": "RootTask", "status": "assigned"}));
        assert_eq!(r.id(), Some(7));
        assert_eq!(r.get_str("status"), Some("assigned"));
        assert_eq!(r.get_i64("status"), None);
    }

    #[test]
    fn record_rejects_non_object() {
        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn describe_includes_sti_type() {
        let task = EntityType::new("Task");
        let r = record(json!({"id": 3, "type": "RootTask"}));
        assert_eq!(r.describe(&task), "Task 3 (RootTask)");

        let plain = record(json!({"id": 3}));
        assert_eq!(plain.describe(&task), "Task 3");
    }

    #[test]
    fn extend_unique_skips_duplicate_ids() {
        let mut set = RecordSet::new();
        let user = EntityType::new("User");
        let added = set.extend_unique(
            &user,
            vec![
                record(json!({"id": 1})),
                record(json!({"id": 2})),
                record(json!({"id": 1, "css_id": "dup"})),
            ],
        );
        assert_eq!(added, 2);
        assert_eq!(set.ids("User"), vec![1, 2]);
        assert!(set.find("User", 1).unwrap().get("css_id").is_none());
    }

    #[test]
    fn extend_unique_large_batches_keep_first_in_order() {
        let mut set = RecordSet::new();
        let task = EntityType::new("Task");
        let first = set.extend_unique(&task, (0..5_000).map(|id| record(json!({"id": id}))));
        let second = set.extend_unique(
            &task,
            (2_500..7_500)
                .rev()
                .map(|id| record(json!({"id": id, "status": "late"}))),
        );

        assert_eq!(first, 5_000);
        assert_eq!(second, 2_500);
        let ids = set.ids("Task");
        assert_eq!(ids.len(), 7_500);
        assert_eq!(&ids[..3], &[0, 1, 2]);
        assert_eq!(ids[5_000], 7_499);
        assert!(set.find("Task", 4_000).unwrap().get("status").is_none());
        assert_eq!(set.extend_unique(&task, vec![record(json!({}))]), 1);
    }

    #[test]
    fn missing_type_reads_as_empty() {
        let set = RecordSet::new();
        assert!(set.get("Hearing").is_empty());
        assert!(!set.contains_type("Hearing"));
        assert!(set.is_empty());
    }

    #[test]
    fn record_set_preserves_type_order() {
        let mut set = RecordSet::new();
        set.insert("Veteran".into(), vec![record(json!({"id": 1}))]);
        set.insert("Appeal".into(), vec![record(json!({"id": 4})), record(json!({"id": 5}))]);
        let types: Vec<_> = set.types().map(EntityType::as_str).collect();
        assert_eq!(types, vec!["Veteran", "Appeal"]);
        assert_eq!(set.total(), 3);
        assert_eq!(set.counts()["Appeal"], 2);
    }
}
