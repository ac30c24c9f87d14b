//! In-memory record store
//!
//! Backs tests and the CLI's JSON snapshot files. Checked creation enforces
//! that every declared reference points at an existing record, the way a
//! database's foreign keys and model validations would.

use crate::error::StoreError;
use crate::store::{values_match, CreationMode, SourceStore, TargetStore};
use indexmap::IndexMap;
use serde_json::Value;
use sjx_schema::{Association, EntityType, Record, RecordSet, Schema};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A create callback that fired for a record created in checked mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Created record's type
    pub entity_type: EntityType,
    /// Created record's id
    pub id: i64,
}

/// Rows of one type in insertion order, indexed by id
#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Record>,
    positions: HashMap<i64, usize>,
    max_id: Option<i64>,
}

impl Table {
    fn get(&self, id: i64) -> Option<&Record> {
        self.positions.get(&id).map(|&position| &self.rows[position])
    }

    fn contains(&self, id: i64) -> bool {
        self.positions.contains_key(&id)
    }

    fn push(&mut self, id: i64, record: Record) {
        self.positions.insert(id, self.rows.len());
        self.max_id = self.max_id.max(Some(id));
        self.rows.push(record);
    }
}

/// Table-per-type store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: IndexMap<EntityType, Table>,
    schema: Option<Arc<Schema>>,
    callbacks: Vec<CallbackEvent>,
}

impl MemoryStore {
    /// Create empty store without reference validation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty store validating checked creations against `schema`
    #[inline]
    #[must_use]
    pub fn with_schema(schema: Arc<Schema>) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    /// Attach a schema to an existing store
    #[must_use]
    pub fn schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Load records as-is, bypassing validation and callbacks
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateId`] or [`StoreError::InvalidId`]
    pub fn seed(
        &mut self,
        entity_type: &str,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<(), StoreError> {
        let entity_type = EntityType::new(entity_type);
        for record in records {
            self.insert(&entity_type, record)?;
        }
        Ok(())
    }

    /// All records of a type
    #[must_use]
    pub fn all(&self, entity_type: &str) -> &[Record] {
        self.tables
            .get(entity_type)
            .map(|table| table.rows.as_slice())
            .unwrap_or_default()
    }

    /// Number of records of a type
    #[inline]
    #[must_use]
    pub fn count(&self, entity_type: &str) -> usize {
        self.all(entity_type).len()
    }

    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.rows.len()).sum()
    }

    /// Whether the store holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create callbacks fired so far, in order
    #[inline]
    #[must_use]
    pub fn callbacks_fired(&self) -> &[CallbackEvent] {
        &self.callbacks
    }

    /// Run `f` as an all-or-nothing unit: on `Err`, every table and the
    /// callback log are restored to their state before the call
    ///
    /// # Errors
    /// Whatever `f` returns
    pub fn transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let tables = self.tables.clone();
        let callbacks = self.callbacks.len();
        let result = f(self);
        if result.is_err() {
            tracing::debug!("rolling back memory store transaction");
            self.tables = tables;
            self.callbacks.truncate(callbacks);
        }
        result
    }

    /// Snapshot of every table
    #[must_use]
    pub fn to_record_set(&self) -> RecordSet {
        self.tables
            .iter()
            .map(|(t, table)| (t.clone(), table.rows.clone()))
            .collect()
    }

    /// Build store from a record set, bypassing validation
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateId`] or [`StoreError::InvalidId`]
    pub fn from_record_set(records: &RecordSet) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for (entity_type, rows) in records.iter() {
            store.seed(entity_type.as_str(), rows.iter().cloned())?;
        }
        Ok(store)
    }

    /// Parse a JSON snapshot (`{"Type": [records...], ...}`)
    ///
    /// # Errors
    /// Returns [`StoreError::Snapshot`] for malformed JSON
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let records: RecordSet = serde_json::from_str(json)?;
        Self::from_record_set(&records)
    }

    /// Render a JSON snapshot
    ///
    /// # Errors
    /// Returns [`StoreError::Snapshot`] if serialization fails
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.to_record_set())?)
    }

    /// Load a JSON snapshot file
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] or [`StoreError::Snapshot`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json =
            std::fs::read_to_string(path).map_err(|e| StoreError::io_error(path, e))?;
        Self::from_json_str(&json)
    }

    /// Write a JSON snapshot file
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] or [`StoreError::Snapshot`]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|e| StoreError::io_error(path, e))
    }

    fn next_id(&self, entity_type: &str) -> i64 {
        self.tables
            .get(entity_type)
            .and_then(|table| table.max_id)
            .map_or(1, |max| max.saturating_add(1))
    }

    fn insert(&mut self, entity_type: &EntityType, mut record: Record) -> Result<i64, StoreError> {
        let id = match record.get("id") {
            None | Some(Value::Null) => {
                let id = self.next_id(entity_type.as_str());
                record.set("id", id);
                id
            }
            Some(value) => value.as_i64().ok_or_else(|| StoreError::InvalidId {
                entity_type: entity_type.to_string(),
            })?,
        };

        if self.exists(entity_type.as_str(), id) {
            return Err(StoreError::DuplicateId {
                entity_type: entity_type.to_string(),
                id,
            });
        }

        self.tables
            .entry(entity_type.clone())
            .or_default()
            .push(id, record);
        Ok(id)
    }

    fn exists(&self, entity_type: &str, id: i64) -> bool {
        self.tables
            .get(entity_type)
            .is_some_and(|table| table.contains(id))
    }

    /// Whether `id` exists in `target`'s table or any descendant's table
    fn exists_as(&self, schema: &Schema, target: &str, id: i64) -> bool {
        self.exists(target, id)
            || schema
                .descendants_of(target)
                .iter()
                .any(|t| self.exists(t.as_str(), id))
    }

    fn validate_references(
        &self,
        schema: &Schema,
        entity_type: &EntityType,
        record: &Record,
    ) -> Result<(), StoreError> {
        let Some(entity) = schema.get(entity_type.as_str()) else {
            return Ok(());
        };

        for assoc in entity.associations() {
            let Some(id) = record.get_i64(assoc.id_field()) else {
                continue;
            };
            let target = match assoc {
                Association::BelongsTo { target, .. } => target.as_str(),
                Association::Polymorphic { type_field, .. } => {
                    let Some(name) = record.get_str(type_field) else {
                        continue;
                    };
                    if !schema.contains(name) {
                        return Err(StoreError::UnknownReferenceType {
                            entity_type: entity_type.to_string(),
                            field: type_field.clone(),
                            target: name.to_string(),
                        });
                    }
                    name
                }
            };
            if !self.exists_as(schema, target, id) {
                return Err(StoreError::MissingReference {
                    entity_type: entity_type.to_string(),
                    field: assoc.id_field().to_string(),
                    target: target.to_string(),
                    id,
                });
            }
        }
        Ok(())
    }
}

impl SourceStore for MemoryStore {
    fn find(&self, entity_type: &str, id: i64) -> Result<Option<Record>, StoreError> {
        Ok(self
            .tables
            .get(entity_type)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn where_in(
        &self,
        entity_type: &str,
        field: &str,
        values: &[Value],
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .all(entity_type)
            .iter()
            .filter(|r| {
                r.get(field)
                    .is_some_and(|v| !v.is_null() && values.iter().any(|x| values_match(v, x)))
            })
            .cloned()
            .collect())
    }
}

impl TargetStore for MemoryStore {
    fn find_by(
        &self,
        entity_type: &str,
        criteria: &[(&str, &Value)],
    ) -> Result<Option<Record>, StoreError> {
        Ok(self
            .all(entity_type)
            .iter()
            .find(|r| {
                criteria
                    .iter()
                    .all(|(field, value)| r.get(field).is_some_and(|v| values_match(v, value)))
            })
            .cloned())
    }

    fn create(
        &mut self,
        entity_type: &EntityType,
        record: Record,
        mode: CreationMode,
    ) -> Result<i64, StoreError> {
        if mode == CreationMode::Checked {
            if let Some(schema) = self.schema.clone() {
                self.validate_references(&schema, entity_type, &record)?;
            }
        }

        let id = self.insert(entity_type, record)?;

        if mode == CreationMode::Checked {
            self.callbacks.push(CallbackEvent {
                entity_type: entity_type.clone(),
                id,
            });
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sjx_schema::EntitySchema;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .with(EntitySchema::new("User"))
                .unwrap()
                .with(EntitySchema::new("Task").belongs_to("assigned_by_id", "User"))
                .unwrap()
                .with(EntitySchema::new("TaskTimer").belongs_to("task_id", "Task"))
                .unwrap()
                .with(EntitySchema::new("Hearing"))
                .unwrap()
                .with(EntitySchema::new("VirtualHearing").polymorphic("hearing", &["Hearing"]))
                .unwrap(),
        )
    }

    #[test]
    fn create_assigns_ids() {
        let mut store = MemoryStore::new();
        let user = EntityType::new("User");
        let a = store
            .create(&user, record(json!({"css_id": "A"})), CreationMode::Checked)
            .unwrap();
        let b = store
            .create(&user, record(json!({"css_id": "B"})), CreationMode::Checked)
            .unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.find("User", 2).unwrap().unwrap().get_str("css_id"), Some("B"));
    }

    #[test]
    fn create_keeps_explicit_id_and_rejects_duplicates() {
        let mut store = MemoryStore::new();
        let user = EntityType::new("User");
        let id = store
            .create(&user, record(json!({"id": 40})), CreationMode::Raw)
            .unwrap();
        assert_eq!(id, 40);
        let err = store
            .create(&user, record(json!({"id": 40})), CreationMode::Raw)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { id: 40, .. }));
    }

    #[test]
    fn id_index_survives_large_seed_and_rollback() {
        let mut store = MemoryStore::new();
        store
            .seed("Task", (1..=10_000).rev().map(|id| record(json!({"id": id}))))
            .unwrap();
        assert_eq!(store.all("Task")[0].id(), Some(10_000));
        assert_eq!(store.find("Task", 5_000).unwrap().unwrap().id(), Some(5_000));
        assert!(matches!(
            store.seed("Task", [record(json!({"id": 1}))]),
            Err(StoreError::DuplicateId { id: 1, .. })
        ));

        let task = EntityType::new("Task");
        let result: Result<(), StoreError> = store.transaction(|tx| {
            let id = tx.create(&task, record(json!({})), CreationMode::Raw)?;
            assert_eq!(id, 10_001);
            Err(StoreError::InvalidId {
                entity_type: "Task".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(store.find("Task", 10_001).unwrap().is_none());
        let id = store
            .create(&task, record(json!({})), CreationMode::Raw)
            .unwrap();
        assert_eq!(id, 10_001);
        assert_eq!(store.count("Task"), 10_001);
    }

    #[test]
    fn checked_create_rejects_dangling_reference() {
        let mut store = MemoryStore::with_schema(schema());
        let err = store
            .create(
                &EntityType::new("TaskTimer"),
                record(json!({"id": 1, "task_id": 99})),
                CreationMode::Checked,
            )
            .unwrap_err();
        assert!(err.is_missing_dependency());
        assert_eq!(store.count("TaskTimer"), 0);
    }

    #[test]
    fn raw_create_skips_validation_and_callbacks() {
        let mut store = MemoryStore::with_schema(schema());
        store
            .create(
                &EntityType::new("Task"),
                record(json!({"id": 5, "assigned_by_id": 77})),
                CreationMode::Raw,
            )
            .unwrap();
        assert_eq!(store.count("Task"), 1);
        assert!(store.callbacks_fired().is_empty());
    }

    #[test]
    fn checked_create_fires_callback() {
        let mut store = MemoryStore::with_schema(schema());
        store.seed("User", [record(json!({"id": 3}))]).unwrap();
        store
            .create(
                &EntityType::new("Task"),
                record(json!({"id": 5, "assigned_by_id": 3})),
                CreationMode::Checked,
            )
            .unwrap();
        assert_eq!(
            store.callbacks_fired(),
            &[CallbackEvent {
                entity_type: EntityType::new("Task"),
                id: 5
            }]
        );
    }

    #[test]
    fn polymorphic_reference_validation() {
        let mut store = MemoryStore::with_schema(schema());
        let vh = EntityType::new("VirtualHearing");

        let unknown = store
            .create(
                &vh,
                record(json!({"hearing_id": 1, "hearing_type": "LegacyHearing"})),
                CreationMode::Checked,
            )
            .unwrap_err();
        assert!(matches!(unknown, StoreError::UnknownReferenceType { .. }));

        store.seed("Hearing", [record(json!({"id": 1}))]).unwrap();
        store
            .create(
                &vh,
                record(json!({"hearing_id": 1, "hearing_type": "Hearing"})),
                CreationMode::Checked,
            )
            .unwrap();
    }

    #[test]
    fn where_in_and_find_by() {
        let mut store = MemoryStore::new();
        store
            .seed(
                "Task",
                [
                    record(json!({"id": 1, "appeal_id": 10, "status": "assigned"})),
                    record(json!({"id": 2, "appeal_id": 11, "status": "completed"})),
                    record(json!({"id": 3, "appeal_id": null})),
                ],
            )
            .unwrap();

        let found = store.where_in("Task", "appeal_id", &[json!(10), json!(11)]).unwrap();
        assert_eq!(found.len(), 2);

        let by = store
            .find_by("Task", &[("appeal_id", &json!(11)), ("status", &json!("completed"))])
            .unwrap()
            .unwrap();
        assert_eq!(by.id(), Some(2));
        assert!(store.find_by("Task", &[("appeal_id", &json!(12))]).unwrap().is_none());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut store = MemoryStore::new();
        store.seed("User", [record(json!({"id": 1}))]).unwrap();

        let result: Result<(), StoreError> = store.transaction(|tx| {
            tx.create(&EntityType::new("User"), record(json!({"id": 2})), CreationMode::Checked)?;
            tx.create(&EntityType::new("User"), record(json!({"id": 1})), CreationMode::Checked)?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(store.count("User"), 1);
        assert!(store.callbacks_fired().is_empty());
    }

    #[test]
    fn snapshot_file_roundtrip() {
        let mut store = MemoryStore::new();
        store
            .seed("Appeal", [record(json!({"id": 1, "uuid": "abc"}))])
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.count("Appeal"), 1);
        assert_eq!(loaded.all("Appeal")[0].get_str("uuid"), Some("abc"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = MemoryStore::load("/nonexistent/sjx/db.json").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
