//! Sanitize field specifications
//!
//! A [`SanitizeSpec`] lists, for one entity type, which fields are sensitive
//! (by literal name or regular expression) and which fields are stripped
//! before redaction.

use crate::error::SanitizeError;
use crate::transforms::TransformKind;
use regex::Regex;

/// Field-name pattern: literal name or unanchored regular expression
#[derive(Debug, Clone)]
pub enum FieldPattern {
    /// Exact field name
    Literal(String),
    /// Regular expression matched anywhere in the field name
    Regex(Regex),
}

impl FieldPattern {
    /// Literal pattern
    #[inline]
    #[must_use]
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal(name.into())
    }

    /// Regex pattern
    ///
    /// # Errors
    /// Returns [`SanitizeError::InvalidPattern`] if the regex does not compile
    pub fn regex(pattern: &str) -> Result<Self, SanitizeError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| SanitizeError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Whether the pattern matches a field name
    #[must_use]
    pub fn matches(&self, field: &str) -> bool {
        match self {
            Self::Literal(name) => name == field,
            Self::Regex(re) => re.is_match(field),
        }
    }

    /// Pattern source text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(name) => name,
            Self::Regex(re) => re.as_str(),
        }
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// One sensitive-field rule
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeField {
    pattern: FieldPattern,
    transform: Option<TransformKind>,
    mapping_key: Option<String>,
}

impl SanitizeField {
    /// Rule for an exact field name
    #[must_use]
    pub fn literal(name: impl Into<String>) -> Self {
        Self::from_pattern(FieldPattern::literal(name))
    }

    /// Rule for field names matching a regex
    ///
    /// # Errors
    /// Returns [`SanitizeError::InvalidPattern`] if the regex does not compile
    pub fn regex(pattern: &str) -> Result<Self, SanitizeError> {
        Ok(Self::from_pattern(FieldPattern::regex(pattern)?))
    }

    /// Rule from a pattern
    #[must_use]
    pub fn from_pattern(pattern: FieldPattern) -> Self {
        Self {
            pattern,
            transform: None,
            mapping_key: None,
        }
    }

    /// Force a transform instead of the field-name heuristic
    #[must_use]
    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Share value mappings with another field name, so equal originals in
    /// both fields redact identically
    #[must_use]
    pub fn shared_as(mut self, key: impl Into<String>) -> Self {
        self.mapping_key = Some(key.into());
        self
    }

    /// Pattern
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &FieldPattern {
        &self.pattern
    }

    /// Transform to use for a matched field
    #[must_use]
    pub fn transform_for(&self, field: &str) -> TransformKind {
        self.transform
            .unwrap_or_else(|| TransformKind::for_field(field))
    }

    /// Value-mapping namespace for a matched field
    #[must_use]
    pub fn mapping_key<'a>(&'a self, field: &'a str) -> &'a str {
        self.mapping_key.as_deref().unwrap_or(field)
    }
}

/// Per-type sanitize configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizeSpec {
    fields: Vec<SanitizeField>,
    strip_fields: Vec<String>,
}

impl SanitizeSpec {
    /// Empty spec: nothing redacted, nothing stripped
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec redacting the given literal field names
    #[must_use]
    pub fn literals(names: &[&str]) -> Self {
        Self {
            fields: names.iter().map(|n| SanitizeField::literal(*n)).collect(),
            strip_fields: Vec::new(),
        }
    }

    /// Add a rule
    #[must_use]
    pub fn field(mut self, field: SanitizeField) -> Self {
        self.fields.push(field);
        self
    }

    /// Remove a field before redaction (never exported)
    #[must_use]
    pub fn strip(mut self, field: impl Into<String>) -> Self {
        self.strip_fields.push(field.into());
        self
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[SanitizeField] {
        &self.fields
    }

    /// Stripped field names
    #[inline]
    #[must_use]
    pub fn strip_fields(&self) -> &[String] {
        &self.strip_fields
    }

    /// First rule matching a field name
    #[must_use]
    pub fn rule_for(&self, field: &str) -> Option<&SanitizeField> {
        self.fields.iter().find(|r| r.pattern.matches(field))
    }

    /// Whether a field name is sensitive
    #[inline]
    #[must_use]
    pub fn is_sensitive(&self, field: &str) -> bool {
        self.rule_for(field).is_some()
    }
}
