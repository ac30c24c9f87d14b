//! SJX Store
//!
//! Record store abstractions for export (read) and import (write), plus
//! [`MemoryStore`], a table-per-type store used by tests and the CLI.
//!
//! # Core Concepts
//!
//! - [`SourceStore`]: Lookups used by retrieval rules
//! - [`TargetStore`]: Natural-key lookups and record creation used on import
//! - [`CreationMode`]: Checked (validated, callbacks) vs raw creation
//!
//! The store never manages transaction boundaries on its own; callers wrap
//! an import in whatever transaction their backend offers
//! ([`MemoryStore::transaction`] for the in-memory store).

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::{CallbackEvent, MemoryStore};
pub use store::{values_match, CreationMode, SourceStore, TargetStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
