//! Export facade: collect, redact, serialize

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, ExchangeResult};
use serde_json::Value;
use sjx_document::{Document, Metadata};
use sjx_registry::{GraphCollector, TypeRegistry};
use sjx_sanitize::{RedactionStats, Redactor, SanitizeSpec};
use sjx_schema::{Record, RecordSet};
use sjx_store::SourceStore;
use uuid::Uuid;

/// Exports record graphs from a source store
pub struct Exporter<'a> {
    registry: &'a TypeRegistry,
    source: &'a dyn SourceStore,
    config: ExchangeConfig,
}

impl<'a> Exporter<'a> {
    /// Create exporter with the default configuration
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, source: &'a dyn SourceStore) -> Self {
        Self {
            registry,
            source,
            config: ExchangeConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Root record whose `uuid` field equals `uuid`
    ///
    /// # Errors
    /// - [`ExchangeError::InvalidUuid`] if `uuid` does not parse
    /// - [`ExchangeError::RootNotFound`] if no root record matches
    /// - [`ExchangeError::Store`] on store failure
    pub fn find_root_by_uuid(&self, uuid: &str) -> ExchangeResult<Record> {
        let parsed = Uuid::parse_str(uuid).map_err(|source| ExchangeError::InvalidUuid {
            value: uuid.to_string(),
            source,
        })?;
        let root_type = self.registry.root_type();
        let wanted = [Value::String(parsed.hyphenated().to_string())];
        self.source
            .where_in(root_type.as_str(), "uuid", &wanted)?
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::RootNotFound {
                entity_type: root_type.to_string(),
                uuid: uuid.to_string(),
            })
    }

    /// Collect the graph reachable from `roots`
    ///
    /// # Errors
    /// [`ExchangeError::Collect`] if a retrieval rule fails
    pub fn collect(&self, roots: Vec<Record>) -> ExchangeResult<RecordSet> {
        Ok(GraphCollector::new(self.registry, self.source).collect(roots)?)
    }

    /// Redact (or, with sanitizing off, only strip) every record
    ///
    /// # Errors
    /// [`ExchangeError::Sanitize`] naming the record that failed
    pub fn redact(&self, records: &RecordSet) -> ExchangeResult<(RecordSet, RedactionStats)> {
        let mut redactor = Redactor::new(self.config.seed);
        let empty = SanitizeSpec::new();
        let mut out = RecordSet::new();

        for (entity_type, rows) in records.iter() {
            let spec = self
                .registry
                .get(entity_type.as_str())
                .map_or(&empty, |c| c.sanitize_spec());
            let mut redacted = Vec::with_capacity(rows.len());
            for record in rows {
                let record = if self.config.sanitize {
                    redactor
                        .redact(entity_type.as_str(), record, spec)
                        .map_err(|source| ExchangeError::Sanitize {
                            description: record.describe(entity_type),
                            source,
                        })?
                } else {
                    redactor.strip(record, spec)
                };
                redacted.push(record);
            }
            out.insert(entity_type.clone(), redacted);
        }
        Ok((out, redactor.stats()))
    }

    /// Collect and redact into a document
    ///
    /// # Errors
    /// Collection or redaction failures
    pub fn export_document(&self, roots: Vec<Record>) -> ExchangeResult<Document> {
        let root_ids: Vec<i64> = roots.iter().filter_map(Record::id).collect();
        let collected = self.collect(roots)?;
        let (records, stats) = self.redact(&collected)?;

        tracing::info!(
            root_type = %self.registry.root_type(),
            records = records.total(),
            sanitized = self.config.sanitize,
            values_redacted = stats.values_redacted,
            mapping_hits = stats.mapping_hits,
            fields_stripped = stats.fields_stripped,
            "export complete"
        );

        let metadata = Metadata::new(
            self.registry.root_type().clone(),
            root_ids,
            self.config.sanitize,
        );
        Ok(Document::new(metadata, records))
    }

    /// [`Self::export_document`] rendered as JSON text
    ///
    /// # Errors
    /// Collection, redaction or serialization failures
    pub fn export_json(&self, roots: Vec<Record>) -> ExchangeResult<String> {
        let document = self.export_document(roots)?;
        Ok(document.to_json(self.config.pretty)?)
    }

    /// Export the graph of the root record with the given uuid
    ///
    /// # Errors
    /// As [`Self::find_root_by_uuid`] and [`Self::export_document`]
    pub fn export_by_uuid(&self, uuid: &str) -> ExchangeResult<Document> {
        let root = self.find_root_by_uuid(uuid)?;
        self.export_document(vec![root])
    }
}
