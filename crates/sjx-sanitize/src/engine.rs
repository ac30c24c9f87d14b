//! Record redaction
//!
//! [`Redactor`] applies a type's [`SanitizeSpec`] to one record at a time,
//! memoizing redactions in a run-scoped [`ValueMapping`].

use crate::error::SanitizeError;
use crate::mapping::ValueMapping;
use crate::pattern::{SanitizeField, SanitizeSpec};
use crate::transforms::{TransformKind, Transformer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sjx_schema::{json_kind, Record};

/// Regenerations allowed before giving up on a field
pub const MAX_ATTEMPTS: u32 = 8;

/// Which redactions bypass the value mapping
///
/// Exempt redactions are regenerated for every occurrence and never recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Transforms that never memoize
    pub exempt_transforms: Vec<TransformKind>,
    /// Field names that never memoize
    pub exempt_fields: Vec<String>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            exempt_transforms: vec![
                TransformKind::RandomPin,
                TransformKind::ObfuscateSentence,
                TransformKind::SimilarDate,
            ],
            exempt_fields: vec![
                "first_name".to_string(),
                "middle_name".to_string(),
                "last_name".to_string(),
            ],
        }
    }
}

impl RedactionPolicy {
    /// Policy that memoizes everything
    #[must_use]
    pub fn memoize_all() -> Self {
        Self {
            exempt_transforms: Vec::new(),
            exempt_fields: Vec::new(),
        }
    }

    /// Whether a redaction skips the value mapping
    #[must_use]
    pub fn is_exempt(&self, transform: TransformKind, field: &str) -> bool {
        self.exempt_transforms.contains(&transform)
            || self.exempt_fields.iter().any(|f| f == field)
    }
}

/// Counters for one redaction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionStats {
    /// Records passed through [`Redactor::redact`]
    pub records: usize,
    /// Scalar values replaced
    pub values_redacted: usize,
    /// Replacements served from the value mapping
    pub mapping_hits: usize,
    /// Fields removed by the pre-redaction hook
    pub fields_stripped: usize,
}

/// Field-level redaction engine for one export run
#[derive(Debug)]
pub struct Redactor {
    transformer: Transformer,
    mapping: ValueMapping,
    policy: RedactionPolicy,
    stats: RedactionStats,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Redactor {
    /// Create redactor; a seed makes generated values reproducible
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            transformer: Transformer::new(seed),
            mapping: ValueMapping::new(),
            policy: RedactionPolicy::default(),
            stats: RedactionStats::default(),
        }
    }

    /// Replace the memoization policy
    #[must_use]
    pub fn with_policy(mut self, policy: RedactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Value mapping built so far
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &ValueMapping {
        &self.mapping
    }

    /// Counters so far
    #[inline]
    #[must_use]
    pub fn stats(&self) -> RedactionStats {
        self.stats
    }

    /// Remove the spec's strip fields without redacting anything
    ///
    /// Used for unsanitized (admin) exports.
    #[must_use]
    pub fn strip(&mut self, record: &Record, spec: &SanitizeSpec) -> Record {
        let mut out = record.clone();
        for field in spec.strip_fields() {
            if out.remove(field).is_some() {
                self.stats.fields_stripped += 1;
            }
        }
        out
    }

    /// Strip, then redact every field matching the spec
    ///
    /// # Errors
    /// - [`SanitizeError::UnsupportedValue`] for object values or non-integer numbers
    /// - [`SanitizeError::InvalidValue`] when a transform cannot parse a value
    /// - [`SanitizeError::Exhausted`] when no candidate differs from the original
    pub fn redact(
        &mut self,
        entity_type: &str,
        record: &Record,
        spec: &SanitizeSpec,
    ) -> Result<Record, SanitizeError> {
        let mut out = self.strip(record, spec);
        self.stats.records += 1;

        let sensitive: Vec<String> = out
            .fields()
            .keys()
            .filter(|field| spec.is_sensitive(field))
            .cloned()
            .collect();

        for field in &sensitive {
            let Some(rule) = spec.rule_for(field) else {
                continue;
            };
            let Some(value) = out.get(field) else {
                continue;
            };
            let redacted = self.redact_value(field, rule, value)?;
            out.set(field.as_str(), redacted);
        }

        tracing::trace!(
            entity_type,
            id = ?out.id(),
            fields = sensitive.len(),
            "redacted record"
        );
        Ok(out)
    }

    fn redact_value(
        &mut self,
        field: &str,
        rule: &SanitizeField,
        value: &Value,
    ) -> Result<Value, SanitizeError> {
        match value {
            Value::Null | Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if s.is_empty() => Ok(value.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| self.redact_value(field, rule, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(_) => Err(SanitizeError::UnsupportedValue {
                field: field.to_string(),
                transform: rule.transform_for(field).name(),
                kind: json_kind(value),
            }),
            Value::String(_) | Value::Number(_) => self.redact_scalar(field, rule, value),
        }
    }

    fn redact_scalar(
        &mut self,
        field: &str,
        rule: &SanitizeField,
        value: &Value,
    ) -> Result<Value, SanitizeError> {
        let transform = rule.transform_for(field);
        let key = rule.mapping_key(field);
        let memoize = !self.policy.is_exempt(transform, field);

        if memoize {
            if let Some(hit) = self.mapping.get(key, value) {
                self.stats.mapping_hits += 1;
                self.stats.values_redacted += 1;
                return Ok(hit.clone());
            }
        }

        let redacted = self.generate(field, transform, value)?;
        if memoize {
            self.mapping.insert(key, value, redacted.clone());
        }
        self.stats.values_redacted += 1;
        Ok(redacted)
    }

    fn generate(
        &mut self,
        field: &str,
        transform: TransformKind,
        value: &Value,
    ) -> Result<Value, SanitizeError> {
        for attempt in 0..MAX_ATTEMPTS {
            let candidate = match value {
                Value::String(s) => {
                    Value::String(self.transformer.apply_str(transform, field, s, attempt)?)
                }
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::from(self.transformer.apply_int(i)),
                    None => {
                        return Err(SanitizeError::UnsupportedValue {
                            field: field.to_string(),
                            transform: transform.name(),
                            kind: "float",
                        })
                    }
                },
                _ => {
                    return Err(SanitizeError::UnsupportedValue {
                        field: field.to_string(),
                        transform: transform.name(),
                        kind: json_kind(value),
                    })
                }
            };
            if !leaks(value, &candidate) {
                return Ok(candidate);
            }
        }
        Err(SanitizeError::Exhausted {
            field: field.to_string(),
        })
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a candidate equals or contains the original
fn leaks(original: &Value, candidate: &Value) -> bool {
    let original = scalar_text(original);
    let candidate = scalar_text(candidate);
    // Every string contains the empty string
    candidate == original || (!original.is_empty() && candidate.contains(&original))
}
