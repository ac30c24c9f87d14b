//! Graph collection
//!
//! [`GraphCollector`] walks the registry in declaration order, running each
//! type's retrieval rule against the records collected so far.

use crate::error::CollectError;
use crate::registry::TypeRegistry;
use sjx_schema::{Record, RecordSet};
use sjx_store::SourceStore;

/// Collects the transitive closure of a root set for one export run
pub struct GraphCollector<'a> {
    registry: &'a TypeRegistry,
    source: &'a dyn SourceStore,
}

impl<'a> GraphCollector<'a> {
    /// Create collector over a registry and a source store
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, source: &'a dyn SourceStore) -> Self {
        Self { registry, source }
    }

    /// Collect every record reachable from `roots`
    ///
    /// Every registered type gets an entry in the result, possibly empty.
    /// Records are deduplicated by id; the first occurrence wins.
    ///
    /// # Errors
    /// - [`CollectError::RootWithoutId`] if a root lacks an integer id
    /// - [`CollectError::Retrieval`] if any rule fails; the run is aborted
    pub fn collect(&self, roots: Vec<Record>) -> Result<RecordSet, CollectError> {
        let root_type = self.registry.root_type();
        if roots.iter().any(|r| r.id().is_none()) {
            return Err(CollectError::RootWithoutId {
                entity_type: root_type.to_string(),
            });
        }

        let mut records = RecordSet::new();
        records.extend_unique(root_type, roots);

        if let Some(rule) = self.registry.root_expansion() {
            let found = rule
                .retrieve(root_type, self.source, &records)
                .map_err(|e| CollectError::retrieval(root_type.as_str(), e))?;
            let added = records.extend_unique(root_type, found);
            tracing::debug!(entity_type = %root_type, added, "expanded root set");
        }

        for config in self.registry.types() {
            let entity_type = config.entity_type();
            if entity_type == root_type {
                continue;
            }
            let found = match config.retrieval() {
                Some(rule) => rule
                    .retrieve(entity_type, self.source, &records)
                    .map_err(|e| CollectError::retrieval(entity_type.as_str(), e))?,
                None => Vec::new(),
            };
            let added = records.extend_unique(entity_type, found);
            tracing::debug!(entity_type = %entity_type, added, "collected records");
        }

        tracing::info!(
            root = %root_type,
            types = records.counts().len(),
            total = records.total(),
            "collection complete"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfig;
    use crate::retrieval::Retrieval;
    use serde_json::{json, Value};
    use sjx_schema::EntityType;
    use sjx_store::{MemoryStore, StoreError};

    fn rec(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new(TypeConfig::new("Appeal"))
            .with(TypeConfig::new("Task").retrieve(Retrieval::has_many_as("Appeal", "appeal")))
            .unwrap()
            .with(
                TypeConfig::new("User").retrieve(Retrieval::Union(vec![
                    Retrieval::polymorphic("Task", "assigned_to"),
                    Retrieval::belongs_to("Task", "assigned_by_id"),
                ])),
            )
            .unwrap()
            .with(TypeConfig::new("Hearing").retrieve(Retrieval::has_many("Appeal", "appeal_id")))
            .unwrap()
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .seed("Appeal", [rec(json!({"id": 1})), rec(json!({"id": 2}))])
            .unwrap();
        store
            .seed(
                "Task",
                [
                    rec(json!({"id": 10, "appeal_id": 1, "appeal_type": "Appeal", "assigned_to_id": 5, "assigned_to_type": "User", "assigned_by_id": 5})),
                    rec(json!({"id": 11, "appeal_id": 1, "appeal_type": "Appeal", "assigned_to_id": 6, "assigned_to_type": "User", "assigned_by_id": 5})),
                    rec(json!({"id": 12, "appeal_id": 2, "appeal_type": "Appeal", "assigned_to_id": 7, "assigned_to_type": "User"})),
                ],
            )
            .unwrap();
        store
            .seed("User", [5, 6, 7].map(|id| rec(json!({"id": id}))))
            .unwrap();
        store
    }

    #[test]
    fn collects_reachable_records_only() {
        let store = store();
        let registry = registry();
        let root = store.all("Appeal")[0].clone();

        let records = GraphCollector::new(&registry, &store)
            .collect(vec![root])
            .unwrap();

        assert_eq!(records.ids("Appeal"), vec![1]);
        assert_eq!(records.ids("Task"), vec![10, 11]);
        assert_eq!(records.ids("User"), vec![5, 6]);
        assert!(records.contains_type("Hearing"));
        assert!(records.get("Hearing").is_empty());
        let types: Vec<_> = records.types().map(EntityType::as_str).collect();
        assert_eq!(types, vec!["Appeal", "Task", "User", "Hearing"]);
    }

    #[test]
    fn duplicate_roots_collapse() {
        let store = store();
        let registry = registry();
        let root = store.all("Appeal")[0].clone();
        let records = GraphCollector::new(&registry, &store)
            .collect(vec![root.clone(), root])
            .unwrap();
        assert_eq!(records.ids("Appeal"), vec![1]);
    }

    #[test]
    fn root_without_id_rejected() {
        let store = store();
        let registry = registry();
        let err = GraphCollector::new(&registry, &store)
            .collect(vec![rec(json!({"uuid": "x"}))])
            .unwrap_err();
        assert!(matches!(err, CollectError::RootWithoutId { .. }));
    }

    #[derive(Debug)]
    struct Failing;

    impl crate::retrieval::CustomRule for Failing {
        fn dependencies(&self) -> Vec<EntityType> {
            vec![EntityType::new("Appeal")]
        }

        fn retrieve(
            &self,
            _target: &EntityType,
            _source: &dyn SourceStore,
            _records: &RecordSet,
        ) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
    }

    #[test]
    fn failing_rule_aborts_with_type() {
        let store = store();
        let registry = registry()
            .with(TypeConfig::new("Veteran").retrieve(Retrieval::custom(Failing)))
            .unwrap();
        let root = store.all("Appeal")[0].clone();
        let err = GraphCollector::new(&registry, &store)
            .collect(vec![root])
            .unwrap_err();
        match err {
            CollectError::Retrieval { entity_type, .. } => assert_eq!(entity_type, "Veteran"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[derive(Debug)]
    struct Sibling;

    impl crate::retrieval::CustomRule for Sibling {
        fn dependencies(&self) -> Vec<EntityType> {
            vec![EntityType::new("Appeal")]
        }

        fn retrieve(
            &self,
            target: &EntityType,
            source: &dyn SourceStore,
            _records: &RecordSet,
        ) -> Result<Vec<Record>, StoreError> {
            source.find_all(target.as_str(), &[2])
        }
    }

    #[test]
    fn root_expansion_merges_into_root_type() {
        let store = store();
        let registry = registry().with_root_expansion(Retrieval::custom(Sibling));
        let root = store.all("Appeal")[0].clone();
        let records = GraphCollector::new(&registry, &store)
            .collect(vec![root])
            .unwrap();
        assert_eq!(records.ids("Appeal"), vec![1, 2]);
        assert_eq!(records.ids("Task"), vec![10, 11, 12]);
        assert_eq!(records.ids("User"), vec![5, 6, 7]);
    }
}
