//! SJX Document
//!
//! The portable JSON document an export produces and an import consumes.
//!
//! ```json
//! { "metadata": { "format_version": 1, "exported_at": "...", "sanitized": true,
//!                 "root_type": "Appeal", "root_ids": [1] },
//!   "Appeal": [ { "id": 1 } ], "Veteran": [ ] }
//! ```
//!
//! [`deserialize`] validates shape only (objects, arrays, integer ids);
//! references are resolved later by the importer.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod document;
mod error;

pub use document::{deserialize, serialize, Document, Metadata, FORMAT_VERSION, METADATA_KEY};
pub use error::DocumentError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
