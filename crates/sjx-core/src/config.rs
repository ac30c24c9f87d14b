//! Exchange configuration

use crate::error::{ExchangeError, ExchangeResult};
use serde::{Deserialize, Serialize};
use sjx_import::DEFAULT_ID_OFFSET;
use std::path::Path;

/// Settings shared by export and import runs
///
/// Loadable from TOML; missing keys take their defaults:
///
/// ```toml
/// id_offset = 2000000000
/// sanitize = true
/// seed = 42
/// strict_references = false
/// pretty = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Amount added to imported ids; also the validation threshold
    pub id_offset: i64,
    /// Redact sensitive fields on export (false for admin exports)
    pub sanitize: bool,
    /// Seed for reproducible redaction
    pub seed: Option<u64>,
    /// Fail imports on unresolved references instead of warning
    pub strict_references: bool,
    /// Pretty-print exported documents
    pub pretty: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            id_offset: DEFAULT_ID_OFFSET,
            sanitize: true,
            seed: None,
            strict_references: false,
            pretty: true,
        }
    }
}

impl ExchangeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    /// - [`ExchangeError::ConfigParse`] for malformed TOML or unknown keys
    /// - [`ExchangeError::InvalidConfig`] for a non-positive id offset
    pub fn from_toml_str(toml: &str) -> ExchangeResult<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// [`ExchangeError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`]
    pub fn from_path(path: impl AsRef<Path>) -> ExchangeResult<Self> {
        let path = path.as_ref();
        let toml =
            std::fs::read_to_string(path).map_err(|e| ExchangeError::config_io(path, e))?;
        Self::from_toml_str(&toml)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ExchangeError::InvalidConfig`] for a non-positive id offset
    pub fn validate(&self) -> ExchangeResult<()> {
        if self.id_offset <= 0 {
            return Err(ExchangeError::InvalidConfig {
                field: "id_offset",
                message: format!("must be positive, got {}", self.id_offset),
            });
        }
        Ok(())
    }

    /// With id offset
    #[inline]
    #[must_use]
    pub fn with_id_offset(mut self, offset: i64) -> Self {
        self.id_offset = offset;
        self
    }

    /// With redaction on or off
    #[inline]
    #[must_use]
    pub fn with_sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    /// With redaction seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// With strict reference checking
    #[inline]
    #[must_use]
    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// With pretty printing
    #[inline]
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ExchangeConfig::default();
        assert_eq!(config.id_offset, 2_000_000_000);
        assert!(config.sanitize);
        assert!(config.pretty);
        assert!(!config.strict_references);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ExchangeConfig::from_toml_str("seed = 7\nstrict_references = true\n").unwrap();
        assert_eq!(
            config,
            ExchangeConfig::new().with_seed(7).with_strict_references(true)
        );
    }

    #[test]
    fn unknown_key_rejected() {
        let err = ExchangeConfig::from_toml_str("offset = 5").unwrap_err();
        assert!(matches!(err, ExchangeError::ConfigParse(_)));
    }

    #[test]
    fn non_positive_offset_rejected() {
        let err = ExchangeConfig::from_toml_str("id_offset = 0").unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidConfig { field: "id_offset", .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id_offset = 1000\nsanitize = false\npretty = false").unwrap();

        let config = ExchangeConfig::from_path(file.path()).unwrap();
        assert_eq!(config.id_offset, 1000);
        assert!(!config.sanitize);
        assert!(!config.pretty);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExchangeConfig::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ExchangeError::ConfigIo { .. }));
    }
}
