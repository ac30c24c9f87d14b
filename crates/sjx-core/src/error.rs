//! Error types for SJX Core
//!
//! Wraps the per-stage errors of an export or import run:
//! - Configuration loading
//! - Registry validation
//! - Graph collection and redaction
//! - Document parsing
//! - Re-association

use sjx_document::DocumentError;
use sjx_import::ImportError;
use sjx_registry::{CollectError, RegistryError};
use sjx_sanitize::SanitizeError;
use sjx_schema::SchemaError;
use sjx_store::StoreError;
use std::path::PathBuf;

/// Result alias for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Main exchange error type
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Configuration file could not be read
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// Config file path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid TOML for [`crate::ExchangeConfig`]
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("invalid config value for {field}: {message}")]
    InvalidConfig {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Registry failed validation
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Schema lookup failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Store failure outside collection and import
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Graph collection failed
    #[error("collection failed: {0}")]
    Collect(#[from] CollectError),

    /// Redaction of a record failed
    #[error("cannot redact {description}: {source}")]
    Sanitize {
        /// Human-readable record description
        description: String,
        /// Redaction failure
        #[source]
        source: SanitizeError,
    },

    /// Document could not be produced or parsed
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Import aborted
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    /// Root lookup argument is not a UUID
    #[error("invalid appeal uuid '{value}': {source}")]
    InvalidUuid {
        /// Raw argument
        value: String,
        /// Parse failure
        #[source]
        source: uuid::Error,
    },

    /// No root record carries the requested UUID
    #[error("no {entity_type} with uuid {uuid}")]
    RootNotFound {
        /// Root type searched
        entity_type: String,
        /// Requested UUID
        uuid: String,
    },
}

impl ExchangeError {
    /// Create config IO error
    #[must_use]
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// Whether the run aborted because a referenced record was absent
    #[inline]
    #[must_use]
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::Import(e) if e.is_missing_dependency())
    }

    /// Whether the input document was rejected before any write
    #[inline]
    #[must_use]
    pub fn is_malformed_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_not_found_display() {
        let err = ExchangeError::RootNotFound {
            entity_type: "Appeal".to_string(),
            uuid: "2c8a7b7e-2f34-4b7e-9a43-6b5f0b1c2d3e".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no Appeal with uuid 2c8a7b7e-2f34-4b7e-9a43-6b5f0b1c2d3e"
        );
        assert!(!err.is_missing_dependency());
    }

    #[test]
    fn document_errors_are_malformed() {
        let err = ExchangeError::from(DocumentError::MissingMetadata);
        assert!(err.is_malformed_document());
    }
}
