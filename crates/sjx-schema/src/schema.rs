//! Statically declared entity schemas
//!
//! Each entity type declares its outgoing references up front; nothing is
//! discovered by reflection at runtime.

use crate::error::SchemaError;
use crate::types::EntityType;
use indexmap::IndexMap;

/// An outgoing reference from one entity type to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// Foreign key accompanied by a sibling `*_type` field naming the target type
    Polymorphic {
        /// Id field, e.g. `assigned_to_id`
        id_field: String,
        /// Discriminator field, e.g. `assigned_to_type`
        type_field: String,
        /// Types the reference may point at (empty = any)
        targets: Vec<EntityType>,
    },
    /// Foreign key whose target type is fixed by the schema
    BelongsTo {
        /// Id field, e.g. `parent_id`
        id_field: String,
        /// Referenced type
        target: EntityType,
    },
}

impl Association {
    /// Polymorphic reference named `name` (`{name}_id` + `{name}_type`)
    #[must_use]
    pub fn polymorphic(name: &str, targets: &[&str]) -> Self {
        Self::Polymorphic {
            id_field: format!("{name}_id"),
            type_field: format!("{name}_type"),
            targets: targets.iter().map(|t| EntityType::new(*t)).collect(),
        }
    }

    /// Untyped foreign key
    #[must_use]
    pub fn belongs_to(id_field: &str, target: &str) -> Self {
        Self::BelongsTo {
            id_field: id_field.to_string(),
            target: EntityType::new(target),
        }
    }

    /// Id field holding the referenced id
    #[inline]
    #[must_use]
    pub fn id_field(&self) -> &str {
        match self {
            Self::Polymorphic { id_field, .. } | Self::BelongsTo { id_field, .. } => id_field,
        }
    }

    /// Whether this reference carries a `*_type` discriminator
    #[inline]
    #[must_use]
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Polymorphic { .. })
    }
}

/// Schema of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    entity_type: EntityType,
    parent: Option<EntityType>,
    associations: Vec<Association>,
    extra_offset_fields: Vec<String>,
}

impl EntitySchema {
    /// Create schema with no references
    #[must_use]
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            parent: None,
            associations: Vec::new(),
            extra_offset_fields: Vec::new(),
        }
    }

    /// Declare a parent type (abstract parent or single-table base)
    #[must_use]
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(EntityType::new(parent));
        self
    }

    /// Declare an untyped foreign key
    #[must_use]
    pub fn belongs_to(mut self, id_field: &str, target: &str) -> Self {
        self.associations
            .push(Association::belongs_to(id_field, target));
        self
    }

    /// Declare a polymorphic reference
    #[must_use]
    pub fn polymorphic(mut self, name: &str, targets: &[&str]) -> Self {
        self.associations
            .push(Association::polymorphic(name, targets));
        self
    }

    /// Declare an id-bearing field that is not a declared association but
    /// still needs offset adjustment on import (e.g. an array of ids)
    #[must_use]
    pub fn offset_field(mut self, field: &str) -> Self {
        self.extra_offset_fields.push(field.to_string());
        self
    }

    /// Entity type
    #[inline]
    #[must_use]
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Parent type, if any
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&EntityType> {
        self.parent.as_ref()
    }

    /// Declared associations
    #[inline]
    #[must_use]
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Extra offset-adjusted fields
    #[inline]
    #[must_use]
    pub fn extra_offset_fields(&self) -> &[String] {
        &self.extra_offset_fields
    }
}

/// Collection of entity schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entities: IndexMap<EntityType, EntitySchema>,
}

impl Schema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity schema
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateEntityType`] if the type is already declared
    pub fn add(&mut self, entity: EntitySchema) -> Result<(), SchemaError> {
        if self.entities.contains_key(entity.entity_type()) {
            return Err(SchemaError::DuplicateEntityType(
                entity.entity_type().to_string(),
            ));
        }
        self.entities.insert(entity.entity_type().clone(), entity);
        Ok(())
    }

    /// Builder-style [`Schema::add`]
    ///
    /// # Errors
    /// Same as [`Schema::add`]
    pub fn with(mut self, entity: EntitySchema) -> Result<Self, SchemaError> {
        self.add(entity)?;
        Ok(self)
    }

    /// Look up a type's schema
    #[inline]
    #[must_use]
    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.entities.get(entity_type)
    }

    /// Look up a type's schema, failing if undeclared
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntityType`] if the type is not declared
    pub fn require(&self, entity_type: &str) -> Result<&EntitySchema, SchemaError> {
        self.get(entity_type)
            .ok_or_else(|| SchemaError::UnknownEntityType(entity_type.to_string()))
    }

    /// Whether a type is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, entity_type: &str) -> bool {
        self.entities.contains_key(entity_type)
    }

    /// All declared types, in declaration order
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.keys()
    }

    /// Transitive descendants of a type (not including the type itself)
    #[must_use]
    pub fn descendants_of(&self, entity_type: &str) -> Vec<EntityType> {
        self.entities
            .keys()
            .filter(|candidate| {
                candidate.as_str() != entity_type && self.is_a(candidate.as_str(), entity_type)
            })
            .cloned()
            .collect()
    }

    /// Whether `entity_type` is `ancestor` or inherits from it
    #[must_use]
    pub fn is_a(&self, entity_type: &str, ancestor: &str) -> bool {
        let mut current = Some(entity_type);
        // Parent chains are short; the bound guards against a declared cycle.
        for _ in 0..=self.entities.len() {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => {
                    current = self
                        .entities
                        .get(name)
                        .and_then(EntitySchema::parent)
                        .map(EntityType::as_str);
                }
                None => return false,
            }
        }
        false
    }
}
