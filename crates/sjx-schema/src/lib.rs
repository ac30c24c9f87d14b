//! SJX Schema
//!
//! Entity types, records and the association introspector.
//!
//! # Core Concepts
//!
//! - [`EntityType`]: Name of a persisted record kind
//! - [`Record`]: JSON field map with an integer `id`
//! - [`RecordSet`]: Ordered per-type collections of records
//! - [`Schema`]: Statically declared references of every entity type
//! - [`AssociationIntrospector`]: Typed/untyped reference queries over a schema
//!
//! # Example
//!
//! ```rust
//! use sjx_schema::{AssociationIntrospector, EntitySchema, EntityType, Schema};
//!
//! let schema = Schema::new()
//!     .with(EntitySchema::new("User"))?
//!     .with(EntitySchema::new("Task").belongs_to("assigned_by_id", "User"))?;
//!
//! let intro = AssociationIntrospector::new(&schema);
//! let fields = intro.reference_fields("Task", &[EntityType::new("User")])?;
//! assert_eq!(fields.untyped, vec!["assigned_by_id".to_string()]);
//! # Ok::<(), sjx_schema::SchemaError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod introspect;
mod schema;
mod types;

pub use error::SchemaError;
pub use introspect::{AssociationIntrospector, ReferenceFields};
pub use schema::{Association, EntitySchema, Schema};
pub use types::{json_kind, EntityType, FieldMap, Record, RecordSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
