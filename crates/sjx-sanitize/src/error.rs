//! Error types for redaction

/// Errors raised while redacting a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
    /// Field pattern is not a valid regular expression
    #[error("invalid field pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex compiler message
        message: String,
    },

    /// Transform cannot handle the value's shape
    #[error("cannot apply {transform} to {field}: unsupported {kind} value")]
    UnsupportedValue {
        /// Field being redacted
        field: String,
        /// Transform name
        transform: &'static str,
        /// JSON kind of the value
        kind: &'static str,
    },

    /// Transform cannot parse the value (e.g. a malformed date)
    #[error("cannot apply {transform} to {field}: {message}")]
    InvalidValue {
        /// Field being redacted
        field: String,
        /// Transform name
        transform: &'static str,
        /// Parse failure
        message: String,
    },

    /// Every attempt reproduced (or embedded) the original value
    #[error("could not produce a redacted value for {field} that differs from the original")]
    Exhausted {
        /// Field being redacted
        field: String,
    },
}
