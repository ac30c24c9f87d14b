//! SJX Sanitize
//!
//! Field-level redaction for exported records.
//!
//! # Core Concepts
//!
//! - [`SanitizeSpec`]: Per-type sensitive field patterns and strip fields
//! - [`TransformKind`]: How a sensitive value is replaced
//! - [`Redactor`]: Applies specs record by record for one export run
//! - [`ValueMapping`]: Run-scoped memo so equal originals redact identically
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use sjx_sanitize::{Redactor, SanitizeSpec};
//! use sjx_schema::Record;
//!
//! let spec = SanitizeSpec::literals(&["ssn"]);
//! let mut redactor = Redactor::new(Some(42));
//!
//! let record = Record::from_value(json!({"id": 1, "ssn": "123-45-6789"}))?;
//! let redacted = redactor.redact("Veteran", &record, &spec)?;
//! assert_ne!(redacted.get_str("ssn"), Some("123-45-6789"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod error;
mod mapping;
mod pattern;
mod transforms;

pub use engine::{RedactionPolicy, RedactionStats, Redactor, MAX_ATTEMPTS};
pub use error::SanitizeError;
pub use mapping::ValueMapping;
pub use pattern::{FieldPattern, SanitizeField, SanitizeSpec};
pub use transforms::{TransformKind, Transformer, SHORT_VALUE_CHARS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
