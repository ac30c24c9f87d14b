//! SJX Registry
//!
//! Static per-type configuration and the graph collector that walks it.
//!
//! # Core Concepts
//!
//! - [`TypeRegistry`]: Types in collection order, rooted at one type
//! - [`TypeConfig`]: Retrieval rule, sanitize spec, tracking, reuse key and
//!   creation mode of one type
//! - [`Retrieval`]: Declarative (or custom) rule discovering records of a type
//! - [`GraphCollector`]: Runs the rules to collect the closure of a root set
//!
//! Rules may only read types collected before them;
//! [`TypeRegistry::validate`] checks this as a DAG over rule dependencies.
//!
//! # Example
//!
//! ```rust,ignore
//! use sjx_registry::{GraphCollector, Retrieval, TypeConfig, TypeRegistry};
//!
//! let registry = TypeRegistry::new(TypeConfig::new("Appeal"))
//!     .with(TypeConfig::new("Task").retrieve(Retrieval::has_many_as("Appeal", "appeal")))?;
//! registry.validate()?;
//!
//! let records = GraphCollector::new(&registry, &store).collect(vec![appeal])?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod collector;
mod config;
mod error;
mod registry;
mod retrieval;

pub use collector::GraphCollector;
pub use config::{ReuseKey, TypeConfig};
pub use error::{CollectError, RegistryError};
pub use registry::TypeRegistry;
pub use retrieval::{CustomRule, Retrieval};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
