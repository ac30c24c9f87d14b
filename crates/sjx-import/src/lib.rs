//! SJX Import
//!
//! Loads an exported document into a target store without colliding with
//! records already there.
//!
//! # Core Concepts
//!
//! - [`Reassociator`]: Imports a document type by type in registry order
//! - [`ImportPolicy`]: Id offset, reference exemptions and strictness
//! - [`IdMapping`]: Original to new ids of tracked types
//! - [`ImportReport`]: Created and reused counts plus validation warnings
//!
//! Every imported id is shifted by the policy's offset. References to tracked
//! types go through the id mapping instead, so a record matched to an
//! existing one by its reuse key is referenced under its existing id.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod error;
mod mapping;
mod policy;
mod report;

pub use engine::Reassociator;
pub use error::ImportError;
pub use mapping::IdMapping;
pub use policy::{ImportPolicy, ReferenceExemption, DEFAULT_ID_OFFSET};
pub use report::{ImportReport, UnresolvedReference};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
