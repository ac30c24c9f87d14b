//! Document difference checks
//!
//! Two comparisons used to verify an export/import cycle:
//!
//! - [`diff_documents`] compares per-type counts and every non-reference
//!   field, ignoring ids and the configured expected differences.
//! - [`same_reference_shape`] checks that two record sets (e.g. the same
//!   document imported into two fresh stores) are isomorphic: every
//!   reference points at the record in the same position of the same type.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sjx_document::Document;
use sjx_schema::{Association, EntityType, Record, RecordSet, Schema};
use std::fmt;

/// Fields allowed to differ, per type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedDifferences {
    fields: IndexMap<EntityType, Vec<String>>,
}

impl ExpectedDifferences {
    /// No expected differences
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `fields` of `entity_type` to differ
    #[must_use]
    pub fn with(mut self, entity_type: &str, fields: &[&str]) -> Self {
        self.fields
            .entry(EntityType::new(entity_type))
            .or_default()
            .extend(fields.iter().map(|f| (*f).to_string()));
        self
    }

    /// Whether a field may differ
    #[must_use]
    pub fn is_expected(&self, entity_type: &str, field: &str) -> bool {
        self.fields
            .get(entity_type)
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    }
}

/// One difference between two record sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    /// Different number of records of a type
    Count {
        /// Record type
        entity_type: EntityType,
        /// Count on the left
        left: usize,
        /// Count on the right
        right: usize,
    },
    /// A compared field differs between records in the same position
    Field {
        /// Record type
        entity_type: EntityType,
        /// Position of the record within its type
        index: usize,
        /// Field name
        field: String,
        /// Left value, absent if the field is missing
        left: Option<Value>,
        /// Right value, absent if the field is missing
        right: Option<Value>,
    },
    /// A reference points at records in different positions
    Reference {
        /// Record type
        entity_type: EntityType,
        /// Position of the record within its type
        index: usize,
        /// Reference id field
        field: String,
        /// Left target
        left: String,
        /// Right target
        right: String,
    },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count {
                entity_type,
                left,
                right,
            } => write!(f, "{entity_type}: {left} records vs {right}"),
            Self::Field {
                entity_type,
                index,
                field,
                left,
                right,
            } => write!(
                f,
                "{entity_type}[{index}].{field}: {} vs {}",
                display_value(left.as_ref()),
                display_value(right.as_ref())
            ),
            Self::Reference {
                entity_type,
                index,
                field,
                left,
                right,
            } => write!(f, "{entity_type}[{index}].{field}: -> {left} vs -> {right}"),
        }
    }
}

fn display_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "(missing)".to_string(), Value::to_string)
}

/// Whether a field holds ids and is left out of value comparison
fn is_id_field(field: &str) -> bool {
    field == "id" || field.ends_with("_id") || field.ends_with("_ids")
}

/// Types of both sets, left order first
fn all_types<'a>(a: &'a RecordSet, b: &'a RecordSet) -> IndexSet<&'a EntityType> {
    a.types().chain(b.types()).collect()
}

fn count_difference(entity_type: &EntityType, left: &[Record], right: &[Record]) -> Option<Difference> {
    (left.len() != right.len()).then(|| Difference::Count {
        entity_type: entity_type.clone(),
        left: left.len(),
        right: right.len(),
    })
}

/// Compare counts and non-id field values of two record sets
///
/// Records are paired by position within their type.
#[must_use]
pub fn diff_record_sets(a: &RecordSet, b: &RecordSet, expected: &ExpectedDifferences) -> Vec<Difference> {
    let mut differences = Vec::new();
    for entity_type in all_types(a, b) {
        let left = a.get(entity_type.as_str());
        let right = b.get(entity_type.as_str());
        if let Some(diff) = count_difference(entity_type, left, right) {
            differences.push(diff);
            continue;
        }

        for (index, (l, r)) in left.iter().zip(right).enumerate() {
            let fields: IndexSet<&String> = l.fields().keys().chain(r.fields().keys()).collect();
            for field in fields {
                if is_id_field(field) || expected.is_expected(entity_type.as_str(), field) {
                    continue;
                }
                let (lv, rv) = (l.get(field), r.get(field));
                if lv != rv {
                    differences.push(Difference::Field {
                        entity_type: entity_type.clone(),
                        index,
                        field: field.clone(),
                        left: lv.cloned(),
                        right: rv.cloned(),
                    });
                }
            }
        }
    }
    differences
}

/// [`diff_record_sets`] over the records of two documents
#[must_use]
pub fn diff_documents(a: &Document, b: &Document, expected: &ExpectedDifferences) -> Vec<Difference> {
    diff_record_sets(a.records(), b.records(), expected)
}

/// Where a reference points, by position
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Null,
    Record(EntityType, usize),
    Dangling(i64),
}

impl Target {
    fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Dangling(_), Self::Dangling(_)) => true,
            _ => self == other,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Record(entity_type, index) => write!(f, "{entity_type}[{index}]"),
            Self::Dangling(id) => write!(f, "missing {id}"),
        }
    }
}

/// Position of a referenced record, searching every stored type related
/// to the referenced one by inheritance
fn locate(records: &RecordSet, schema: &Schema, target: &str, id: i64) -> Target {
    for entity_type in records.types() {
        let related = entity_type == target
            || schema.is_a(entity_type.as_str(), target)
            || schema.is_a(target, entity_type.as_str());
        if !related {
            continue;
        }
        if let Some(index) = records
            .get(entity_type.as_str())
            .iter()
            .position(|r| r.id() == Some(id))
        {
            return Target::Record(entity_type.clone(), index);
        }
    }
    Target::Dangling(id)
}

fn resolve(records: &RecordSet, schema: &Schema, record: &Record, assoc: &Association) -> Target {
    let Some(id) = record.get_i64(assoc.id_field()) else {
        return Target::Null;
    };
    match assoc {
        Association::BelongsTo { target, .. } => locate(records, schema, target.as_str(), id),
        Association::Polymorphic { type_field, .. } => match record.get_str(type_field) {
            Some(target) => locate(records, schema, target, id),
            None => Target::Dangling(id),
        },
    }
}

/// Reference differences between two record sets
///
/// Records are paired by position within their type; references are
/// compared by the position of their target. References to records absent
/// from both sets are considered equal.
#[must_use]
pub fn reference_differences(a: &RecordSet, b: &RecordSet, schema: &Schema) -> Vec<Difference> {
    let mut differences = Vec::new();
    for entity_type in all_types(a, b) {
        let left = a.get(entity_type.as_str());
        let right = b.get(entity_type.as_str());
        if let Some(diff) = count_difference(entity_type, left, right) {
            differences.push(diff);
            continue;
        }
        let Some(entity) = schema.get(entity_type.as_str()) else {
            continue;
        };

        for (index, (l, r)) in left.iter().zip(right).enumerate() {
            for assoc in entity.associations() {
                let lt = resolve(a, schema, l, assoc);
                let rt = resolve(b, schema, r, assoc);
                if !lt.matches(&rt) {
                    differences.push(Difference::Reference {
                        entity_type: entity_type.clone(),
                        index,
                        field: assoc.id_field().to_string(),
                        left: lt.to_string(),
                        right: rt.to_string(),
                    });
                }
            }
        }
    }
    differences
}

/// Whether two record sets have the same reference graph
#[must_use]
pub fn same_reference_shape(a: &RecordSet, b: &RecordSet, schema: &Schema) -> bool {
    let differences = reference_differences(a, b, schema);
    for diff in &differences {
        tracing::debug!(%diff, "reference shape differs");
    }
    differences.is_empty()
}
