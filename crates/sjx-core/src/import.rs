//! Import facade: deserialize, reassociate

use crate::config::ExchangeConfig;
use crate::error::ExchangeResult;
use sjx_document::{deserialize, Document};
use sjx_import::{ImportPolicy, ImportReport, Reassociator, ReferenceExemption};
use sjx_registry::TypeRegistry;
use sjx_schema::Schema;
use sjx_store::TargetStore;

/// Imports documents into a target store
#[derive(Debug, Clone)]
pub struct Importer<'a> {
    registry: &'a TypeRegistry,
    schema: &'a Schema,
    config: ExchangeConfig,
    exemptions: Vec<ReferenceExemption>,
}

impl<'a> Importer<'a> {
    /// Create importer with the default configuration and no exemptions
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, schema: &'a Schema) -> Self {
        Self {
            registry,
            schema,
            config: ExchangeConfig::default(),
            exemptions: Vec::new(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Add validation exemptions
    #[must_use]
    pub fn with_exemptions(mut self, exemptions: impl IntoIterator<Item = ReferenceExemption>) -> Self {
        self.exemptions.extend(exemptions);
        self
    }

    /// Engine policy derived from the configuration
    #[must_use]
    pub fn policy(&self) -> ImportPolicy {
        ImportPolicy::new()
            .with_id_offset(self.config.id_offset)
            .with_exemptions(self.exemptions.iter().cloned())
            .strict(self.config.strict_references)
    }

    /// Reassociate and create every record of a parsed document
    ///
    /// # Errors
    /// [`crate::ExchangeError::Import`] if the engine aborts
    pub fn import_document(
        &self,
        document: &Document,
        target: &mut dyn TargetStore,
    ) -> ExchangeResult<ImportReport> {
        let metadata = document.metadata();
        if !metadata.sanitized {
            tracing::warn!(exported_at = %metadata.exported_at, "importing an unsanitized document");
        }
        let report = Reassociator::new(self.registry, self.schema)
            .with_policy(self.policy())
            .import(document, target)?;
        Ok(report)
    }

    /// Parse then import a JSON document
    ///
    /// Malformed documents are rejected before anything is written.
    ///
    /// # Errors
    /// [`crate::ExchangeError::Document`] for malformed input, otherwise as
    /// [`Self::import_document`]
    pub fn import_json(&self, json: &str, target: &mut dyn TargetStore) -> ExchangeResult<ImportReport> {
        let document = deserialize(json)?;
        self.import_document(&document, target)
    }
}
