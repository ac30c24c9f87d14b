//! Re-association engine
//!
//! Imports a [`Document`] into a [`TargetStore`], rewriting ids so imported
//! records never collide with existing ones and every reference points at
//! the imported (or reused) counterpart of its original target.

use crate::error::ImportError;
use crate::mapping::IdMapping;
use crate::policy::ImportPolicy;
use crate::report::{ImportReport, UnresolvedReference};
use serde_json::Value;
use sjx_document::Document;
use sjx_registry::{ReuseKey, TypeConfig, TypeRegistry};
use sjx_schema::{AssociationIntrospector, EntityType, Record, Schema, SchemaError};
use sjx_store::{StoreError, TargetStore};
use std::collections::BTreeSet;

/// Reference fields of one type, grouped by how they are rewritten
#[derive(Debug, Default)]
struct TypePlan {
    /// Untyped references to untracked types plus extra offset fields
    offset_fields: Vec<String>,
    /// Polymorphic `(id_field, type_field)` pairs
    typed: Vec<(String, String)>,
    /// Untyped references to tracked types
    tracked_refs: Vec<(String, EntityType)>,
}

/// Mutable state of one import run
#[derive(Debug, Default)]
struct ImportRun {
    mapping: IdMapping,
    report: ImportReport,
}

/// Imports documents according to a registry, schema and policy
#[derive(Debug, Clone)]
pub struct Reassociator<'a> {
    registry: &'a TypeRegistry,
    schema: &'a Schema,
    policy: ImportPolicy,
    tracked: Vec<EntityType>,
}

impl<'a> Reassociator<'a> {
    /// Create engine with the default policy
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, schema: &'a Schema) -> Self {
        Self {
            registry,
            schema,
            policy: ImportPolicy::default(),
            tracked: registry.tracked_types(),
        }
    }

    /// Replace the policy
    #[must_use]
    pub fn with_policy(mut self, policy: ImportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    /// Import every registered type of the document
    ///
    /// Types are processed first-types first, then in registry order.
    /// Document types without a registry entry are skipped with a warning.
    ///
    /// # Errors
    /// - [`ImportError::MissingDependency`] if the store rejects a dangling reference
    /// - [`ImportError::UnresolvedReference`] in strict mode
    /// - [`ImportError::Store`] on any other store failure
    /// - [`ImportError::Schema`] if a registered type has no schema
    pub fn import(
        &self,
        document: &Document,
        target: &mut dyn TargetStore,
    ) -> Result<ImportReport, ImportError> {
        let mut run = ImportRun::default();

        for entity_type in document.records().types() {
            if !self.registry.contains(entity_type.as_str()) {
                tracing::warn!(entity_type = %entity_type, "ignoring unregistered document type");
                run.report.skipped_types.push(entity_type.clone());
            }
        }

        for config in self.registry.import_order() {
            let entity_type = config.entity_type();
            let records = document.records().get(entity_type.as_str());
            if records.is_empty() {
                continue;
            }
            let plan = self.plan(entity_type)?;
            for record in records {
                self.import_record(config, &plan, record, target, &mut run)?;
            }
            tracing::debug!(
                entity_type = %entity_type,
                created = run.report.created_count(entity_type.as_str()),
                reused = run.report.reused_count(entity_type.as_str()),
                "imported type"
            );
        }

        run.report.id_mapping = run.mapping;
        tracing::info!(
            created = run.report.total_created(),
            reused = run.report.total_reused(),
            warnings = run.report.warnings.len(),
            "import complete"
        );
        Ok(run.report)
    }

    fn plan(&self, entity_type: &EntityType) -> Result<TypePlan, SchemaError> {
        let intro = AssociationIntrospector::new(self.schema);
        let untracked = self.registry.untracked_types();

        let offset_fields = intro.offset_fields(entity_type.as_str(), &untracked)?;
        let typed = intro
            .typed_fields_excluding(entity_type.as_str(), &offset_fields)?
            .into_iter()
            .filter_map(|id_field| {
                let type_field = intro.type_field_for(entity_type.as_str(), &id_field)?;
                Some((id_field, type_field.to_string()))
            })
            .collect();

        let mut tracked_refs = Vec::new();
        for tracked in &self.tracked {
            for field in intro.untyped_fields_to(entity_type.as_str(), tracked)? {
                tracked_refs.push((field, tracked.clone()));
            }
        }

        Ok(TypePlan {
            offset_fields,
            typed,
            tracked_refs,
        })
    }

    fn is_tracked(&self, entity_type: &str) -> bool {
        self.tracked.iter().any(|t| t.as_str() == entity_type)
    }

    /// Rewrite references; returns the record and the fields resolved through
    /// the id mapping
    fn reassociate(
        &self,
        plan: &TypePlan,
        record: &Record,
        mapping: &IdMapping,
    ) -> (Record, BTreeSet<String>) {
        let offset = self.policy.id_offset();
        let mut out = record.clone();
        let mut resolved = BTreeSet::new();

        for field in &plan.offset_fields {
            if let Some(value) = out.get(field) {
                let shifted = shift(value, offset);
                out.set(field.as_str(), shifted);
            }
        }

        for (id_field, type_field) in &plan.typed {
            let (Some(id), Some(type_name)) = (
                out.get_i64(id_field),
                out.get_str(type_field).map(str::to_owned),
            ) else {
                continue;
            };
            if self.is_tracked(&type_name) {
                if let Some(new_id) = mapping.get(&type_name, id) {
                    out.set(id_field.as_str(), new_id);
                    resolved.insert(id_field.clone());
                }
            } else {
                out.set(id_field.as_str(), id.saturating_add(offset));
            }
        }

        for (field, target) in &plan.tracked_refs {
            let Some(id) = out.get_i64(field) else {
                continue;
            };
            if let Some(new_id) = mapping.get(target.as_str(), id) {
                out.set(field.as_str(), new_id);
                resolved.insert(field.clone());
            }
        }

        (out, resolved)
    }

    fn import_record(
        &self,
        config: &TypeConfig,
        plan: &TypePlan,
        record: &Record,
        target: &mut dyn TargetStore,
        run: &mut ImportRun,
    ) -> Result<(), ImportError> {
        let entity_type = config.entity_type();
        let original_id = record.id().ok_or_else(|| ImportError::RecordWithoutId {
            entity_type: entity_type.to_string(),
        })?;
        let description = record.describe(entity_type);
        let (mut imported, resolved) = self.reassociate(plan, record, &run.mapping);

        if let Some(key) = config.reuse_key() {
            let existing = find_existing(&*target, entity_type, key, &imported).map_err(|source| {
                ImportError::Store {
                    description: description.clone(),
                    source,
                }
            })?;
            if let Some(existing_id) = existing {
                if config.is_tracked() {
                    run.mapping.insert(entity_type, original_id, existing_id);
                }
                run.report.count_reused(entity_type);
                tracing::debug!(record = %description, existing_id, "reusing existing record");
                return Ok(());
            }
        }

        imported.set("id", original_id.saturating_add(self.policy.id_offset()));

        for warning in self.unresolved(entity_type, original_id, &imported, &resolved) {
            if self.policy.is_strict() {
                return Err(ImportError::UnresolvedReference(warning));
            }
            tracing::warn!(%warning, "unresolved reference");
            run.report.warnings.push(warning);
        }

        let new_id = target
            .create(entity_type, imported, config.creation_mode())
            .map_err(|source| {
                if source.is_missing_dependency() {
                    ImportError::MissingDependency {
                        entity_type: entity_type.to_string(),
                        original_id,
                        description: description.clone(),
                        source,
                    }
                } else {
                    ImportError::Store {
                        description: description.clone(),
                        source,
                    }
                }
            })?;

        if config.is_tracked() {
            run.mapping.insert(entity_type, original_id, new_id);
        }
        run.report.count_created(entity_type);
        Ok(())
    }

    /// Validation pass: integer `*_id` fields still below the offset
    fn unresolved(
        &self,
        entity_type: &EntityType,
        original_id: i64,
        record: &Record,
        resolved: &BTreeSet<String>,
    ) -> Vec<UnresolvedReference> {
        let offset = self.policy.id_offset();
        record
            .fields()
            .iter()
            .filter(|(field, _)| field.ends_with("_id") && !resolved.contains(*field))
            .filter_map(|(field, value)| Some((field, value.as_i64()?)))
            .filter(|(field, value)| {
                *value < offset
                    && !self
                        .policy
                        .is_exempt(self.schema, entity_type.as_str(), field, record)
            })
            .map(|(field, value)| UnresolvedReference {
                entity_type: entity_type.clone(),
                original_id,
                field: field.clone(),
                value,
            })
            .collect()
    }
}

/// Add the offset to an integer, or to each integer of an array
fn shift(value: &Value, offset: i64) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| shift(v, offset)).collect()),
        other => match other.as_i64() {
            Some(id) => Value::from(id.saturating_add(offset)),
            None => other.clone(),
        },
    }
}

/// Id of a target record matching the reuse key, if every key field is set
fn find_existing(
    target: &dyn TargetStore,
    entity_type: &EntityType,
    key: &ReuseKey,
    record: &Record,
) -> Result<Option<i64>, StoreError> {
    let mut criteria = Vec::with_capacity(key.fields().len());
    for field in key.fields() {
        match record.get(field) {
            Some(value) if !value.is_null() => criteria.push((field.as_str(), value)),
            _ => return Ok(None),
        }
    }
    Ok(target
        .find_by(entity_type.as_str(), &criteria)?
        .and_then(|existing| existing.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ReferenceExemption;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sjx_document::Metadata;
    use sjx_registry::Retrieval;
    use sjx_schema::{EntitySchema, RecordSet};
    use sjx_store::{CreationMode, MemoryStore};
    use std::sync::Arc;

    const OFFSET: i64 = 2_000_000_000;

    fn rec(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn schema() -> Schema {
        Schema::new()
            .with(EntitySchema::new("Appeal"))
            .unwrap()
            .with(
                EntitySchema::new("Task")
                    .polymorphic("appeal", &["Appeal"])
                    .polymorphic("assigned_to", &["User", "Organization"])
                    .belongs_to("assigned_by_id", "User")
                    .belongs_to("parent_id", "Task"),
            )
            .unwrap()
            .with(EntitySchema::new("TaskTimer").belongs_to("task_id", "Task"))
            .unwrap()
            .with(EntitySchema::new("User"))
            .unwrap()
            .with(EntitySchema::new("Organization"))
            .unwrap()
            .with(
                EntitySchema::new("OrganizationsUser")
                    .belongs_to("organization_id", "Organization")
                    .belongs_to("user_id", "User"),
            )
            .unwrap()
            .with(
                EntitySchema::new("CavcRemand")
                    .belongs_to("source_appeal_id", "Appeal")
                    .offset_field("decision_issue_ids"),
            )
            .unwrap()
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new(
            TypeConfig::new("Appeal")
                .tracked()
                .reuse_by(ReuseKey::field("uuid")),
        )
        .with(
            TypeConfig::new("Task")
                .retrieve(Retrieval::has_many_as("Appeal", "appeal"))
                .raw(),
        )
        .unwrap()
        .with(TypeConfig::new("TaskTimer").retrieve(Retrieval::has_many("Task", "task_id")))
        .unwrap()
        .with(TypeConfig::new("CavcRemand").retrieve(Retrieval::has_many("Appeal", "source_appeal_id")))
        .unwrap()
        .with(
            TypeConfig::new("User")
                .retrieve(Retrieval::polymorphic("Task", "assigned_to"))
                .tracked()
                .reuse_by(ReuseKey::field("css_id")),
        )
        .unwrap()
        .with(
            TypeConfig::new("Organization")
                .retrieve(Retrieval::polymorphic("Task", "assigned_to"))
                .tracked()
                .reuse_by(ReuseKey::field("url")),
        )
        .unwrap()
        .with(
            TypeConfig::new("OrganizationsUser")
                .retrieve(Retrieval::has_many("User", "user_id"))
                .reuse_by(ReuseKey::composite(&["organization_id", "user_id"])),
        )
        .unwrap()
        .with_first_types(&["Appeal", "Organization", "User"])
    }

    fn document() -> Document {
        let mut records = RecordSet::new();
        records.insert(EntityType::new("Appeal"), vec![rec(json!({"id": 1, "uuid": "a-1"}))]);
        records.insert(
            EntityType::new("Task"),
            vec![
                rec(json!({"id": 10, "appeal_id": 1, "appeal_type": "Appeal", "assigned_to_id": 5, "assigned_to_type": "User", "assigned_by_id": 5, "parent_id": null})),
                rec(json!({"id": 11, "appeal_id": 1, "appeal_type": "Appeal", "assigned_to_id": 7, "assigned_to_type": "Organization", "assigned_by_id": 5, "parent_id": 10})),
            ],
        );
        records.insert(EntityType::new("TaskTimer"), vec![rec(json!({"id": 3, "task_id": 11}))]);
        records.insert(
            EntityType::new("CavcRemand"),
            vec![rec(json!({"id": 2, "source_appeal_id": 1, "decision_issue_ids": [40, 41]}))],
        );
        records.insert(EntityType::new("User"), vec![rec(json!({"id": 5, "css_id": "BVAAA"}))]);
        records.insert(
            EntityType::new("Organization"),
            vec![rec(json!({"id": 7, "url": "bva-dispatch"}))],
        );
        records.insert(
            EntityType::new("OrganizationsUser"),
            vec![rec(json!({"id": 9, "organization_id": 7, "user_id": 5}))],
        );
        Document::new(Metadata::new(EntityType::new("Appeal"), vec![1], true), records)
    }

    fn target(schema: &Schema) -> MemoryStore {
        MemoryStore::with_schema(Arc::new(schema.clone()))
    }

    #[test]
    fn imports_with_offsets_and_mapping() {
        let schema = schema();
        let registry = registry();
        let mut store = target(&schema);

        let report = Reassociator::new(&registry, &schema)
            .import(&document(), &mut store)
            .unwrap();

        assert!(report.is_clean(), "warnings: {:?}", report.warnings);
        assert_eq!(report.total_created(), 8);
        assert_eq!(report.id_mapping.get("User", 5), Some(OFFSET + 5));
        assert_eq!(report.id_mapping.get("Appeal", 1), Some(OFFSET + 1));
        assert_eq!(report.id_mapping.get("Task", 10), None);

        let task = store.all("Task")[1].clone();
        assert_eq!(task.id(), Some(OFFSET + 11));
        assert_eq!(task.get_i64("appeal_id"), Some(OFFSET + 1));
        assert_eq!(task.get_i64("assigned_to_id"), Some(OFFSET + 7));
        assert_eq!(task.get_i64("assigned_by_id"), Some(OFFSET + 5));
        assert_eq!(task.get_i64("parent_id"), Some(OFFSET + 10));

        let timer = &store.all("TaskTimer")[0];
        assert_eq!(timer.get_i64("task_id"), Some(OFFSET + 11));

        let remand = &store.all("CavcRemand")[0];
        assert_eq!(
            remand.get("decision_issue_ids"),
            Some(&json!([OFFSET + 40, OFFSET + 41]))
        );
    }

    #[test]
    fn import_order_puts_first_types_first() {
        let schema = schema();
        let registry = registry();
        let mut store = target(&schema);
        Reassociator::new(&registry, &schema)
            .import(&document(), &mut store)
            .unwrap();

        let order: Vec<_> = store
            .callbacks_fired()
            .iter()
            .map(|c| c.entity_type.to_string())
            .collect();
        // Task is created raw, so it fires no callback.
        assert_eq!(
            order,
            vec!["Appeal", "Organization", "User", "TaskTimer", "CavcRemand", "OrganizationsUser"]
        );
    }

    #[test]
    fn reuse_by_natural_key() {
        let schema = schema();
        let registry = registry();
        let mut store = target(&schema);
        store.seed("User", [rec(json!({"id": 42, "css_id": "BVAAA"}))]).unwrap();
        store
            .seed("Organization", [rec(json!({"id": 3, "url": "bva-dispatch"}))])
            .unwrap();
        store
            .seed("OrganizationsUser", [rec(json!({"id": 1, "organization_id": 3, "user_id": 42}))])
            .unwrap();

        let report = Reassociator::new(&registry, &schema)
            .with_policy(ImportPolicy::new().with_exemptions([
                ReferenceExemption::new("Task", "assigned_to_id").when("assigned_to_type", "Organization"),
            ]))
            .import(&document(), &mut store)
            .unwrap();

        assert_eq!(report.reused_count("User"), 1);
        assert_eq!(report.reused_count("Organization"), 1);
        assert_eq!(report.reused_count("OrganizationsUser"), 1);
        assert_eq!(store.count("User"), 1);
        assert_eq!(store.count("OrganizationsUser"), 1);
        assert_eq!(report.id_mapping.get("User", 5), Some(42));

        let task = &store.all("Task")[0];
        assert_eq!(task.get_i64("assigned_to_id"), Some(42));
        assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn dangling_reference_warns() {
        let schema = schema();
        let registry = registry();
        let mut records = document().records().clone();
        records.insert(
            EntityType::new("Task"),
            vec![rec(json!({"id": 10, "appeal_id": 1, "appeal_type": "Appeal", "assigned_to_id": 5, "assigned_to_type": "User", "assigned_by_id": 77}))],
        );
        records.insert(EntityType::new("TaskTimer"), vec![]);
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        let report = Reassociator::new(&registry, &schema)
            .import(&doc, &mut store)
            .unwrap();

        assert_eq!(
            report.warnings,
            vec![UnresolvedReference {
                entity_type: EntityType::new("Task"),
                original_id: 10,
                field: "assigned_by_id".to_string(),
                value: 77,
            }]
        );
        assert_eq!(store.count("Task"), 1);
    }

    #[test]
    fn strict_mode_rejects_dangling_reference() {
        let schema = schema();
        let registry = registry();
        let mut records = document().records().clone();
        records.insert(
            EntityType::new("Task"),
            vec![rec(json!({"id": 10, "appeal_id": 1, "appeal_type": "Appeal", "assigned_by_id": 77}))],
        );
        records.insert(EntityType::new("TaskTimer"), vec![]);
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        let err = Reassociator::new(&registry, &schema)
            .with_policy(ImportPolicy::new().strict(true))
            .import(&doc, &mut store)
            .unwrap_err();
        assert!(matches!(err, ImportError::UnresolvedReference(_)));
        assert_eq!(store.count("Task"), 0);
    }

    #[test]
    fn missing_dependency_is_fatal() {
        let schema = schema();
        let registry = registry();
        let mut records = document().records().clone();
        records.insert(EntityType::new("TaskTimer"), vec![rec(json!({"id": 3, "task_id": 999}))]);
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        let err = Reassociator::new(&registry, &schema)
            .import(&doc, &mut store)
            .unwrap_err();
        match err {
            ImportError::MissingDependency {
                entity_type,
                original_id,
                ..
            } => {
                assert_eq!(entity_type, "TaskTimer");
                assert_eq!(original_id, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_dependency_rolls_back_in_transaction() {
        let schema = schema();
        let registry = registry();
        let mut records = document().records().clone();
        records.insert(EntityType::new("TaskTimer"), vec![rec(json!({"id": 3, "task_id": 999}))]);
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        let engine = Reassociator::new(&registry, &schema);
        let result = store.transaction(|tx| engine.import(&doc, tx));
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn unregistered_types_are_skipped() {
        let schema = schema();
        let registry = registry();
        let mut records = document().records().clone();
        records.insert(EntityType::new("LegacyAppeal"), vec![rec(json!({"id": 1}))]);
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        let report = Reassociator::new(&registry, &schema)
            .import(&doc, &mut store)
            .unwrap();
        assert_eq!(report.skipped_types, vec![EntityType::new("LegacyAppeal")]);
        assert_eq!(store.count("LegacyAppeal"), 0);
    }

    #[test]
    fn untracked_polymorphic_type_is_offset() {
        let schema = schema();
        let registry = registry();
        let mut records = RecordSet::new();
        records.insert(
            EntityType::new("Task"),
            vec![rec(json!({"id": 10, "appeal_id": 8, "appeal_type": "LegacyAppeal"}))],
        );
        let doc = Document::new(document().metadata().clone(), records);

        let mut store = target(&schema);
        Reassociator::new(&registry, &schema)
            .import(&doc, &mut store)
            .unwrap();
        assert_eq!(store.all("Task")[0].get_i64("appeal_id"), Some(OFFSET + 8));
    }

    #[test]
    fn custom_offset() {
        let schema = schema();
        let registry = registry();
        let mut store = target(&schema);
        let report = Reassociator::new(&registry, &schema)
            .with_policy(ImportPolicy::new().with_id_offset(1_000))
            .import(&document(), &mut store)
            .unwrap();
        assert_eq!(report.id_mapping.get("Appeal", 1), Some(1_001));
        assert_eq!(store.all("TaskTimer")[0].get_i64("task_id"), Some(1_011));
    }

    #[test]
    fn raw_creation_skips_store_validation() {
        let registry = registry();
        let task = registry.require("Task").unwrap();
        assert_eq!(task.creation_mode(), CreationMode::Raw);
    }
}
