//! Error types for the registry and collector

use sjx_store::StoreError;

/// Registry declaration and rule-order errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Type registered twice
    #[error("entity type '{0}' is already registered")]
    DuplicateType(String),

    /// Type name not registered
    #[error("entity type '{0}' is not registered")]
    UnknownType(String),

    /// A rule reads a type that has no registry entry
    #[error("retrieval rule for {entity_type} depends on unregistered type {dependency}")]
    UnknownDependency {
        /// Type whose rule is invalid
        entity_type: String,
        /// Missing dependency
        dependency: String,
    },

    /// A rule reads a type declared at or after its own position
    #[error("retrieval rule for {entity_type} depends on {dependency}, which is collected later")]
    DependencyOrder {
        /// Type whose rule is invalid
        entity_type: String,
        /// Dependency declared too late
        dependency: String,
    },

    /// Rule dependencies form a cycle
    #[error("retrieval rules form a cycle through {0}")]
    Cycle(String),

    /// Root type has a retrieval rule of its own
    #[error("root type {0} cannot have a retrieval rule; use a root expansion")]
    RootRule(String),
}

/// Errors aborting a collection run
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// A type's retrieval rule failed
    #[error("retrieval for {entity_type} failed: {source}")]
    Retrieval {
        /// Type being collected
        entity_type: String,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// A root record lacks an integer id
    #[error("root {entity_type} record has no integer id")]
    RootWithoutId {
        /// Root type
        entity_type: String,
    },
}

impl CollectError {
    /// Create retrieval error for a type
    pub fn retrieval(entity_type: impl Into<String>, source: StoreError) -> Self {
        Self::Retrieval {
            entity_type: entity_type.into(),
            source,
        }
    }
}
