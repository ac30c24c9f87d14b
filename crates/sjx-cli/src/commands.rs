//! Subcommand bodies, free of argument parsing and printing

use anyhow::Context;
use sjx_core::{diff_documents, Difference, Exchange, ExchangeConfig};
use sjx_document::{deserialize, Document};
use sjx_import::ImportReport;
use sjx_schema::EntityType;
use sjx_store::MemoryStore;
use std::path::Path;
use std::sync::Arc;

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    deserialize(&json).with_context(|| format!("parsing document {}", path.display()))
}

/// Export the appeal with uuid `appeal` from the snapshot at `db`
pub(crate) fn export(config: ExchangeConfig, db: &Path, appeal: &str) -> anyhow::Result<String> {
    let exchange = Exchange::appeals(config)?;
    let source = MemoryStore::load(db)?;
    let document = exchange.exporter(&source).export_by_uuid(appeal)?;
    Ok(document.to_json(exchange.config().pretty)?)
}

/// Import the document at `document` into the snapshot at `db`, writing the
/// result to `out`
///
/// Nothing is written when the import fails.
pub(crate) fn import(
    config: ExchangeConfig,
    db: &Path,
    document: &Path,
    out: &Path,
) -> anyhow::Result<ImportReport> {
    let exchange = Exchange::appeals(config)?;
    let schema = Arc::new(exchange.schema().clone());
    let mut target = if db.exists() {
        MemoryStore::load(db)?.schema(schema)
    } else {
        tracing::info!(db = %db.display(), "starting from an empty store");
        MemoryStore::with_schema(schema)
    };

    let document = read_document(document)?;
    let importer = exchange.importer();
    let report = target.transaction(|tx| importer.import_document(&document, tx))?;

    target.save(out)?;
    tracing::info!(
        created = report.total_created(),
        reused = report.total_reused(),
        warnings = report.warnings.len(),
        out = %out.display(),
        "import complete"
    );
    Ok(report)
}

/// Differences between two documents beyond ids and expected fields
pub(crate) fn diff(config: ExchangeConfig, left: &Path, right: &Path) -> anyhow::Result<Vec<Difference>> {
    let exchange = Exchange::appeals(config)?;
    let left = read_document(left)?;
    let right = read_document(right)?;
    Ok(diff_documents(&left, &right, exchange.expected_differences()))
}

/// Registry types in dependency order
pub(crate) fn check(config: ExchangeConfig) -> anyhow::Result<Vec<EntityType>> {
    let exchange = Exchange::appeals(config)?;
    Ok(exchange.check_registry()?)
}
