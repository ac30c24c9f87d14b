//! Retrieval rules
//!
//! A rule maps the records collected so far (plus read access to the source
//! store) to newly discovered records of one type. Declarative variants
//! expose the types they read, so rule ordering can be validated before a
//! run; [`CustomRule`] implementations declare theirs explicitly.

use serde_json::Value;
use sjx_schema::{EntityType, Record, RecordSet};
use sjx_store::{SourceStore, StoreError};
use std::fmt::Debug;
use std::sync::Arc;

/// Hand-written retrieval rule
pub trait CustomRule: Debug + Send + Sync {
    /// Types whose collected records this rule reads
    fn dependencies(&self) -> Vec<EntityType>;

    /// Discover records of `target`
    ///
    /// # Errors
    /// Store failures
    fn retrieve(
        &self,
        target: &EntityType,
        source: &dyn SourceStore,
        records: &RecordSet,
    ) -> Result<Vec<Record>, StoreError>;
}

/// How records of one type are discovered
#[derive(Debug, Clone)]
pub enum Retrieval {
    /// Records referenced by `from.field`
    BelongsTo {
        /// Referencing type
        from: EntityType,
        /// Foreign-key field on `from`
        field: String,
    },
    /// Records referenced by `from.id_field` where `from.type_field` names the target type
    Polymorphic {
        /// Referencing type
        from: EntityType,
        /// Id half of the polymorphic pair
        id_field: String,
        /// Type half of the polymorphic pair
        type_field: String,
    },
    /// Target records whose `foreign_key` points at collected `from` records
    HasMany {
        /// Referenced type
        from: EntityType,
        /// Foreign-key field on the target
        foreign_key: String,
        /// Target's type discriminator, required to name `from` when set
        type_field: Option<String>,
    },
    /// Target records whose `target_field` equals some collected `from.from_field`
    MatchingField {
        /// Type holding the value
        from: EntityType,
        /// Field on `from`
        from_field: String,
        /// Field on the target
        target_field: String,
    },
    /// Concatenation of several rules
    Union(Vec<Retrieval>),
    /// Hand-written rule
    Custom(Arc<dyn CustomRule>),
}

impl Retrieval {
    /// `BelongsTo` rule
    #[must_use]
    pub fn belongs_to(from: &str, field: &str) -> Self {
        Self::BelongsTo {
            from: EntityType::new(from),
            field: field.to_string(),
        }
    }

    /// `Polymorphic` rule for a `{name}_id`/`{name}_type` pair
    #[must_use]
    pub fn polymorphic(from: &str, name: &str) -> Self {
        Self::Polymorphic {
            from: EntityType::new(from),
            id_field: format!("{name}_id"),
            type_field: format!("{name}_type"),
        }
    }

    /// `HasMany` rule over a plain foreign key
    #[must_use]
    pub fn has_many(from: &str, foreign_key: &str) -> Self {
        Self::HasMany {
            from: EntityType::new(from),
            foreign_key: foreign_key.to_string(),
            type_field: None,
        }
    }

    /// `HasMany` rule over a polymorphic `{name}_id`/`{name}_type` pair
    #[must_use]
    pub fn has_many_as(from: &str, name: &str) -> Self {
        Self::HasMany {
            from: EntityType::new(from),
            foreign_key: format!("{name}_id"),
            type_field: Some(format!("{name}_type")),
        }
    }

    /// `MatchingField` rule
    #[must_use]
    pub fn matching(from: &str, from_field: &str, target_field: &str) -> Self {
        Self::MatchingField {
            from: EntityType::new(from),
            from_field: from_field.to_string(),
            target_field: target_field.to_string(),
        }
    }

    /// `Custom` rule
    #[must_use]
    pub fn custom(rule: impl CustomRule + 'static) -> Self {
        Self::Custom(Arc::new(rule))
    }

    /// Types this rule reads, deduplicated in first-seen order
    #[must_use]
    pub fn dependencies(&self) -> Vec<EntityType> {
        let mut deps = Vec::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut Vec<EntityType>) {
        match self {
            Self::BelongsTo { from, .. }
            | Self::Polymorphic { from, .. }
            | Self::HasMany { from, .. }
            | Self::MatchingField { from, .. } => push_unique(deps, from.clone()),
            Self::Custom(rule) => {
                for dep in rule.dependencies() {
                    push_unique(deps, dep);
                }
            }
            Self::Union(rules) => {
                for rule in rules {
                    rule.collect_dependencies(deps);
                }
            }
        }
    }

    /// Run the rule
    ///
    /// Results may contain duplicates; the collector deduplicates by id.
    ///
    /// # Errors
    /// Store failures
    pub fn retrieve(
        &self,
        target: &EntityType,
        source: &dyn SourceStore,
        records: &RecordSet,
    ) -> Result<Vec<Record>, StoreError> {
        match self {
            Self::BelongsTo { from, field } => {
                let ids = int_values(records.get(from.as_str()), field, |_| true);
                source.find_all(target.as_str(), &ids)
            }
            Self::Polymorphic {
                from,
                id_field,
                type_field,
            } => {
                let ids = int_values(records.get(from.as_str()), id_field, |r| {
                    r.get_str(type_field) == Some(target.as_str())
                });
                source.find_all(target.as_str(), &ids)
            }
            Self::HasMany {
                from,
                foreign_key,
                type_field,
            } => {
                let ids: Vec<Value> = records.ids(from.as_str()).into_iter().map(Value::from).collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let mut found = source.where_in(target.as_str(), foreign_key, &ids)?;
                if let Some(type_field) = type_field {
                    found.retain(|r| r.get_str(type_field) == Some(from.as_str()));
                }
                Ok(found)
            }
            Self::MatchingField {
                from,
                from_field,
                target_field,
            } => {
                let values = distinct_values(records.get(from.as_str()), from_field);
                if values.is_empty() {
                    return Ok(Vec::new());
                }
                source.where_in(target.as_str(), target_field, &values)
            }
            Self::Union(rules) => {
                let mut found = Vec::new();
                for rule in rules {
                    found.extend(rule.retrieve(target, source, records)?);
                }
                Ok(found)
            }
            Self::Custom(rule) => rule.retrieve(target, source, records),
        }
    }
}

fn push_unique(deps: &mut Vec<EntityType>, dep: EntityType) {
    if !deps.contains(&dep) {
        deps.push(dep);
    }
}

/// Distinct integer values of `field` on the records passing `keep`
fn int_values(records: &[Record], field: &str, keep: impl Fn(&Record) -> bool) -> Vec<i64> {
    let mut ids = Vec::new();
    for record in records.iter().filter(|r| keep(r)) {
        if let Some(id) = record.get_i64(field) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Distinct non-null values of `field`
fn distinct_values(records: &[Record], field: &str) -> Vec<Value> {
    let mut values: Vec<Value> = Vec::new();
    for value in records.iter().filter_map(|r| r.get(field)) {
        if !value.is_null() && !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}
