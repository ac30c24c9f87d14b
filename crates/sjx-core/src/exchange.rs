//! Exchange: schema, registry and configuration bundled for one domain

use crate::appeals;
use crate::config::ExchangeConfig;
use crate::difference::ExpectedDifferences;
use crate::error::ExchangeResult;
use crate::export::Exporter;
use crate::import::Importer;
use sjx_import::ReferenceExemption;
use sjx_registry::TypeRegistry;
use sjx_schema::{EntityType, Schema, SchemaError};
use sjx_store::SourceStore;

/// A validated registry with its schema, configuration, import exemptions
/// and expected round-trip differences
#[derive(Debug, Clone)]
pub struct Exchange {
    schema: Schema,
    registry: TypeRegistry,
    config: ExchangeConfig,
    exemptions: Vec<ReferenceExemption>,
    expected: ExpectedDifferences,
}

impl Exchange {
    /// Bundle and validate
    ///
    /// # Errors
    /// As [`Self::check_registry`], or [`crate::ExchangeError::InvalidConfig`]
    pub fn new(schema: Schema, registry: TypeRegistry, config: ExchangeConfig) -> ExchangeResult<Self> {
        config.validate()?;
        let exchange = Self {
            schema,
            registry,
            config,
            exemptions: Vec::new(),
            expected: ExpectedDifferences::new(),
        };
        exchange.check_registry()?;
        Ok(exchange)
    }

    /// The appeal-domain exchange
    ///
    /// # Errors
    /// Only if the built-in declarations are inconsistent
    pub fn appeals(config: ExchangeConfig) -> ExchangeResult<Self> {
        Ok(Self::new(appeals::schema()?, appeals::registry()?, config)?
            .with_exemptions(appeals::exemptions())
            .with_expected_differences(appeals::expected_differences()))
    }

    /// Add import validation exemptions
    #[must_use]
    pub fn with_exemptions(mut self, exemptions: impl IntoIterator<Item = ReferenceExemption>) -> Self {
        self.exemptions.extend(exemptions);
        self
    }

    /// Replace the expected differences
    #[must_use]
    pub fn with_expected_differences(mut self, expected: ExpectedDifferences) -> Self {
        self.expected = expected;
        self
    }

    /// Validate rule ordering and that every registered type has a schema
    ///
    /// Returns the types in dependency order.
    ///
    /// # Errors
    /// - [`crate::ExchangeError::Registry`] if a rule reads a later, unknown
    ///   or circularly dependent type
    /// - [`crate::ExchangeError::Schema`] if a registered type has no schema
    pub fn check_registry(&self) -> ExchangeResult<Vec<EntityType>> {
        let order = self.registry.validate()?;
        if let Some(missing) = self
            .registry
            .entity_types()
            .find(|t| !self.schema.contains(t.as_str()))
        {
            return Err(SchemaError::UnknownEntityType(missing.to_string()).into());
        }
        tracing::debug!(types = order.len(), "registry checked");
        Ok(order)
    }

    /// Schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Import validation exemptions
    #[inline]
    #[must_use]
    pub fn exemptions(&self) -> &[ReferenceExemption] {
        &self.exemptions
    }

    /// Fields allowed to differ across an export/import cycle
    #[inline]
    #[must_use]
    pub fn expected_differences(&self) -> &ExpectedDifferences {
        &self.expected
    }

    /// Exporter reading from `source`
    #[must_use]
    pub fn exporter<'a>(&'a self, source: &'a dyn SourceStore) -> Exporter<'a> {
        Exporter::new(&self.registry, source).with_config(self.config.clone())
    }

    /// Importer with this exchange's exemptions
    #[must_use]
    pub fn importer(&self) -> Importer<'_> {
        Importer::new(&self.registry, &self.schema)
            .with_config(self.config.clone())
            .with_exemptions(self.exemptions.iter().cloned())
    }
}
