//! SJX Core - sanitized exchange of appeal record graphs
//!
//! Ties the pipeline together:
//! - Loads [`ExchangeConfig`] from TOML
//! - Declares the appeal-domain schema and registry ([`appeals`])
//! - Exports: collect, redact, serialize ([`Exporter`])
//! - Imports: deserialize, reassociate, create ([`Importer`])
//! - Compares documents and imported graphs ([`difference`])
//!
//! # Example
//!
//! ```rust,ignore
//! use sjx_core::{Exchange, ExchangeConfig};
//! use sjx_store::MemoryStore;
//!
//! let exchange = Exchange::appeals(ExchangeConfig::new().with_seed(7))?;
//! let source = MemoryStore::load("prod.json")?;
//!
//! let document = exchange.exporter(&source).export_by_uuid(uuid)?;
//!
//! let mut target = MemoryStore::load("dev.json")?;
//! let report = exchange.importer().import_document(&document, &mut target)?;
//! println!("created {} records", report.total_created());
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod appeals;
pub mod config;
pub mod difference;
pub mod error;
pub mod exchange;
pub mod export;
pub mod import;

// Re-exports for convenience
pub use config::ExchangeConfig;
pub use difference::{
    diff_documents, diff_record_sets, reference_differences, same_reference_shape, Difference,
    ExpectedDifferences,
};
pub use error::{ExchangeError, ExchangeResult};
pub use exchange::Exchange;
pub use export::Exporter;
pub use import::Importer;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for export and import runs
    pub use crate::{
        Exchange, ExchangeConfig, ExchangeError, ExchangeResult, Exporter, Importer,
    };
    pub use sjx_document::{deserialize, serialize, Document, Metadata};
    pub use sjx_import::{IdMapping, ImportReport, UnresolvedReference};
    pub use sjx_schema::{EntityType, Record, RecordSet};
    pub use sjx_store::{MemoryStore, SourceStore, TargetStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
