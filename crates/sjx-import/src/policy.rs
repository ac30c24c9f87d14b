//! Import policy: id offset, reference exemptions, strictness

use serde_json::Value;
use sjx_schema::{EntityType, Record, Schema};

/// Default amount added to imported ids
pub const DEFAULT_ID_OFFSET: i64 = 2_000_000_000;

/// A reference field the validation pass must not report
///
/// Applies to the named type and its descendants, optionally only when
/// another field of the record holds a given value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceExemption {
    entity_type: EntityType,
    field: String,
    condition: Option<(String, Value)>,
}

impl ReferenceExemption {
    /// Exempt `entity_type.field`
    #[must_use]
    pub fn new(entity_type: &str, field: &str) -> Self {
        Self {
            entity_type: EntityType::new(entity_type),
            field: field.to_string(),
            condition: None,
        }
    }

    /// Only exempt when `field == value` on the same record
    #[must_use]
    pub fn when(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.condition = Some((field.to_string(), value.into()));
        self
    }

    /// Whether the exemption covers a field of a record
    #[must_use]
    pub fn applies(&self, schema: &Schema, entity_type: &str, field: &str, record: &Record) -> bool {
        if self.field != field {
            return false;
        }
        if !schema.is_a(entity_type, self.entity_type.as_str()) {
            return false;
        }
        match &self.condition {
            None => true,
            Some((other, expected)) => record.get(other) == Some(expected),
        }
    }
}

/// Knobs of the re-association engine
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPolicy {
    id_offset: i64,
    exemptions: Vec<ReferenceExemption>,
    strict_references: bool,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            id_offset: DEFAULT_ID_OFFSET,
            exemptions: Vec::new(),
            strict_references: false,
        }
    }
}

impl ImportPolicy {
    /// Default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set id offset
    #[must_use]
    pub fn with_id_offset(mut self, offset: i64) -> Self {
        self.id_offset = offset;
        self
    }

    /// Add exemptions
    #[must_use]
    pub fn with_exemptions(mut self, exemptions: impl IntoIterator<Item = ReferenceExemption>) -> Self {
        self.exemptions.extend(exemptions);
        self
    }

    /// Fail the import on the first unresolved reference instead of warning
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// Id offset
    #[inline]
    #[must_use]
    pub fn id_offset(&self) -> i64 {
        self.id_offset
    }

    /// Exemptions
    #[inline]
    #[must_use]
    pub fn exemptions(&self) -> &[ReferenceExemption] {
        &self.exemptions
    }

    /// Whether unresolved references abort the import
    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict_references
    }

    /// Whether any exemption covers a field of a record
    #[must_use]
    pub fn is_exempt(&self, schema: &Schema, entity_type: &str, field: &str, record: &Record) -> bool {
        self.exemptions
            .iter()
            .any(|e| e.applies(schema, entity_type, field, record))
    }
}
