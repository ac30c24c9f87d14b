//! Association introspection
//!
//! Answers "which fields of this type point at which other types", split
//! into typed (polymorphic, with a sibling `*_type` field) and untyped
//! (plain foreign key) references. Purely reads schema metadata.

use crate::error::SchemaError;
use crate::schema::{Association, Schema};
use crate::types::EntityType;
use std::collections::BTreeSet;

/// Reference field names of one entity type, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFields {
    /// Polymorphic id fields (sorted)
    pub typed: Vec<String>,
    /// Plain foreign keys (sorted)
    pub untyped: Vec<String>,
}

impl ReferenceFields {
    /// All reference field names, typed first
    #[must_use]
    pub fn all(&self) -> Vec<&str> {
        self.typed
            .iter()
            .chain(&self.untyped)
            .map(String::as_str)
            .collect()
    }

    /// Whether no reference fields were found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.untyped.is_empty()
    }
}

/// Read-only view over a [`Schema`] answering association queries
#[derive(Debug, Clone, Copy)]
pub struct AssociationIntrospector<'a> {
    schema: &'a Schema,
}

impl<'a> AssociationIntrospector<'a> {
    /// Create introspector over a schema
    #[inline]
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Known types plus all their descendants
    fn expand_known(&self, known: &[EntityType]) -> BTreeSet<EntityType> {
        known
            .iter()
            .flat_map(|t| {
                std::iter::once(t.clone()).chain(self.schema.descendants_of(t.as_str()))
            })
            .collect()
    }

    /// Fields of `entity_type` referencing any of the `known` types
    ///
    /// A polymorphic field counts when it declares no target restriction or
    /// when one of its targets is known.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntityType`] if `entity_type` is undeclared
    pub fn reference_fields(
        &self,
        entity_type: &str,
        known: &[EntityType],
    ) -> Result<ReferenceFields, SchemaError> {
        let entity = self.schema.require(entity_type)?;
        let known = self.expand_known(known);

        let mut typed = BTreeSet::new();
        let mut untyped = BTreeSet::new();
        for assoc in entity.associations() {
            match assoc {
                Association::Polymorphic {
                    id_field, targets, ..
                } => {
                    if targets.is_empty() || targets.iter().any(|t| known.contains(t)) {
                        typed.insert(id_field.clone());
                    }
                }
                Association::BelongsTo { id_field, target } => {
                    if known.contains(target) {
                        untyped.insert(id_field.clone());
                    }
                }
            }
        }

        Ok(ReferenceFields {
            typed: typed.into_iter().collect(),
            untyped: untyped.into_iter().collect(),
        })
    }

    /// All polymorphic id fields of `entity_type` except `excluding`
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntityType`] if `entity_type` is undeclared
    pub fn typed_fields_excluding(
        &self,
        entity_type: &str,
        excluding: &[String],
    ) -> Result<Vec<String>, SchemaError> {
        let entity = self.schema.require(entity_type)?;
        let mut fields: Vec<String> = entity
            .associations()
            .iter()
            .filter(|a| a.is_typed() && !excluding.iter().any(|e| e == a.id_field()))
            .map(|a| a.id_field().to_string())
            .collect();
        fields.sort();
        Ok(fields)
    }

    /// Untyped foreign keys of `entity_type` pointing at `target` (or a descendant)
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntityType`] if `entity_type` is undeclared
    pub fn untyped_fields_to(
        &self,
        entity_type: &str,
        target: &EntityType,
    ) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .reference_fields(entity_type, std::slice::from_ref(target))?
            .untyped)
    }

    /// Fields whose values are shifted by the id offset on import:
    /// untyped references to `known` types plus schema-declared extras
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntityType`] if `entity_type` is undeclared
    pub fn offset_fields(
        &self,
        entity_type: &str,
        known: &[EntityType],
    ) -> Result<Vec<String>, SchemaError> {
        let entity = self.schema.require(entity_type)?;
        let mut fields: BTreeSet<String> = self
            .reference_fields(entity_type, known)?
            .untyped
            .into_iter()
            .collect();
        fields.extend(entity.extra_offset_fields().iter().cloned());
        Ok(fields.into_iter().collect())
    }

    /// Type-discriminator field paired with a polymorphic id field
    #[must_use]
    pub fn type_field_for(&self, entity_type: &str, id_field: &str) -> Option<&'a str> {
        self.schema
            .get(entity_type)?
            .associations()
            .iter()
            .find_map(|a| match a {
                Association::Polymorphic {
                    id_field: f,
                    type_field,
                    ..
                } if f == id_field => Some(type_field.as_str()),
                _ => None,
            })
    }
}
