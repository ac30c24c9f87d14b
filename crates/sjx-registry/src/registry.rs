//! Type registry
//!
//! Provides [`TypeRegistry`], the static declaration of every exported type
//! in collection order, and its rule-order validation.

use crate::config::TypeConfig;
use crate::error::RegistryError;
use crate::retrieval::Retrieval;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use sjx_schema::EntityType;

/// Ordered per-type configuration, rooted at one type
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    root: EntityType,
    root_expansion: Option<Retrieval>,
    types: IndexMap<EntityType, TypeConfig>,
    first_types: Vec<EntityType>,
}

impl TypeRegistry {
    /// Create registry whose first entry is the root type
    #[must_use]
    pub fn new(root: TypeConfig) -> Self {
        let name = root.entity_type().clone();
        let mut types = IndexMap::new();
        types.insert(name.clone(), root);
        Self {
            root: name,
            root_expansion: None,
            types,
            first_types: Vec::new(),
        }
    }

    /// Rule discovering further root records from the initial roots
    #[must_use]
    pub fn with_root_expansion(mut self, rule: Retrieval) -> Self {
        self.root_expansion = Some(rule);
        self
    }

    /// Types imported before all others, in the given order
    #[must_use]
    pub fn with_first_types(mut self, names: &[&str]) -> Self {
        self.first_types = names.iter().map(|n| EntityType::new(*n)).collect();
        self
    }

    /// Append a type
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateType`] if already registered
    pub fn register(&mut self, config: TypeConfig) -> Result<(), RegistryError> {
        let name = config.entity_type().clone();
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType(name.to_string()));
        }
        self.types.insert(name, config);
        Ok(())
    }

    /// Append a type, builder style
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateType`] if already registered
    pub fn with(mut self, config: TypeConfig) -> Result<Self, RegistryError> {
        self.register(config)?;
        Ok(self)
    }

    /// Root type
    #[inline]
    #[must_use]
    pub fn root_type(&self) -> &EntityType {
        &self.root
    }

    /// Root expansion rule
    #[inline]
    #[must_use]
    pub fn root_expansion(&self) -> Option<&Retrieval> {
        self.root_expansion.as_ref()
    }

    /// Configuration of a type
    #[inline]
    #[must_use]
    pub fn get(&self, entity_type: &str) -> Option<&TypeConfig> {
        self.types.get(entity_type)
    }

    /// Configuration of a type that must exist
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownType`]
    pub fn require(&self, entity_type: &str) -> Result<&TypeConfig, RegistryError> {
        self.get(entity_type)
            .ok_or_else(|| RegistryError::UnknownType(entity_type.to_string()))
    }

    /// Whether a type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }

    /// Configurations in declaration order
    pub fn types(&self) -> impl Iterator<Item = &TypeConfig> {
        self.types.values()
    }

    /// Type names in declaration order
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.types.keys()
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Types whose import records the id mapping
    #[must_use]
    pub fn tracked_types(&self) -> Vec<EntityType> {
        self.types()
            .filter(|c| c.is_tracked())
            .map(|c| c.entity_type().clone())
            .collect()
    }

    /// Types without id tracking
    #[must_use]
    pub fn untracked_types(&self) -> Vec<EntityType> {
        self.types()
            .filter(|c| !c.is_tracked())
            .map(|c| c.entity_type().clone())
            .collect()
    }

    /// Import order: first types, then the rest in declaration order
    #[must_use]
    pub fn import_order(&self) -> Vec<&TypeConfig> {
        let firsts = self.first_types.iter().filter_map(|t| self.get(t.as_str()));
        let rest = self
            .types()
            .filter(|c| !self.first_types.contains(c.entity_type()));
        firsts.chain(rest).collect()
    }

    /// Check that every rule only reads types collected before it
    ///
    /// Returns the dependency order of the types (a topological sort of the
    /// rule graph).
    ///
    /// # Errors
    /// - [`RegistryError::RootRule`] if the root has its own rule
    /// - [`RegistryError::UnknownType`] for unregistered first types
    /// - [`RegistryError::UnknownDependency`] for rules reading unregistered types
    /// - [`RegistryError::Cycle`] if dependencies are circular
    /// - [`RegistryError::DependencyOrder`] if a rule reads a later type
    pub fn validate(&self) -> Result<Vec<EntityType>, RegistryError> {
        let names: Vec<&EntityType> = self.types.keys().collect();

        if self
            .get(self.root.as_str())
            .is_some_and(|c| c.retrieval().is_some())
        {
            return Err(RegistryError::RootRule(self.root.to_string()));
        }
        if let Some(rule) = &self.root_expansion {
            if let Some(dep) = rule.dependencies().into_iter().find(|d| *d != self.root) {
                return Err(RegistryError::DependencyOrder {
                    entity_type: self.root.to_string(),
                    dependency: dep.to_string(),
                });
            }
        }
        if let Some(unknown) = self.first_types.iter().find(|t| !self.contains(t.as_str())) {
            return Err(RegistryError::UnknownType(unknown.to_string()));
        }

        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        let mut edges = Vec::new();
        for (index, config) in self.types.values().enumerate() {
            graph.add_node(index);
            let Some(rule) = config.retrieval() else {
                continue;
            };
            for dep in rule.dependencies() {
                let dep_index = self.types.get_index_of(&dep).ok_or_else(|| {
                    RegistryError::UnknownDependency {
                        entity_type: config.entity_type().to_string(),
                        dependency: dep.to_string(),
                    }
                })?;
                graph.add_edge(dep_index, index, ());
                edges.push((dep_index, index));
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| RegistryError::Cycle(names[cycle.node_id()].to_string()))?;

        if let Some((dep, index)) = edges.into_iter().find(|(dep, index)| dep >= index) {
            return Err(RegistryError::DependencyOrder {
                entity_type: names[index].to_string(),
                dependency: names[dep].to_string(),
            });
        }

        tracing::debug!(types = order.len(), "retrieval rule order validated");
        Ok(order.into_iter().map(|i| names[i].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(TypeConfig::new("Appeal").tracked())
            .with(TypeConfig::new("Task").retrieve(Retrieval::has_many_as("Appeal", "appeal")))
            .unwrap()
            .with(TypeConfig::new("TaskTimer").retrieve(Retrieval::has_many("Task", "task_id")))
            .unwrap()
            .with(
                TypeConfig::new("User")
                    .retrieve(Retrieval::polymorphic("Task", "assigned_to"))
                    .tracked(),
            )
            .unwrap()
            .with_first_types(&["Appeal", "User"])
    }

    #[test]
    fn valid_registry() {
        let order = registry().validate().unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0].as_str(), "Appeal");
    }

    #[test]
    fn duplicate_type_rejected() {
        let err = registry().with(TypeConfig::new("Task")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateType("Task".to_string()));
    }

    #[test]
    fn later_dependency_rejected() {
        let reg = TypeRegistry::new(TypeConfig::new("Appeal"))
            .with(TypeConfig::new("TaskTimer").retrieve(Retrieval::has_many("Task", "task_id")))
            .unwrap()
            .with(TypeConfig::new("Task").retrieve(Retrieval::has_many("Appeal", "appeal_id")))
            .unwrap();
        assert_eq!(
            reg.validate().unwrap_err(),
            RegistryError::DependencyOrder {
                entity_type: "TaskTimer".to_string(),
                dependency: "Task".to_string(),
            }
        );
    }

    #[test]
    fn unknown_dependency_rejected() {
        let reg = TypeRegistry::new(TypeConfig::new("Appeal"))
            .with(TypeConfig::new("Task").retrieve(Retrieval::has_many("Hearing", "hearing_id")))
            .unwrap();
        assert!(matches!(
            reg.validate(),
            Err(RegistryError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn cycle_rejected() {
        let reg = TypeRegistry::new(TypeConfig::new("Appeal"))
            .with(TypeConfig::new("Task").retrieve(Retrieval::belongs_to("User", "task_id")))
            .unwrap()
            .with(TypeConfig::new("User").retrieve(Retrieval::belongs_to("Task", "user_id")))
            .unwrap();
        assert!(matches!(reg.validate(), Err(RegistryError::Cycle(_))));
    }

    #[test]
    fn self_dependency_is_cycle() {
        let reg = TypeRegistry::new(TypeConfig::new("Appeal"))
            .with(TypeConfig::new("Task").retrieve(Retrieval::has_many("Task", "parent_id")))
            .unwrap();
        assert_eq!(
            reg.validate().unwrap_err(),
            RegistryError::Cycle("Task".to_string())
        );
    }

    #[test]
    fn root_rule_rejected() {
        let reg = TypeRegistry::new(
            TypeConfig::new("Appeal").retrieve(Retrieval::has_many("Appeal", "id")),
        );
        assert_eq!(
            reg.validate().unwrap_err(),
            RegistryError::RootRule("Appeal".to_string())
        );
    }

    #[test]
    fn root_expansion_may_only_read_root() {
        let reg = registry().with_root_expansion(Retrieval::belongs_to("Task", "appeal_id"));
        assert!(matches!(
            reg.validate(),
            Err(RegistryError::DependencyOrder { .. })
        ));
    }

    #[test]
    fn unknown_first_type_rejected() {
        let reg = registry().with_first_types(&["HearingDay"]);
        assert_eq!(
            reg.validate().unwrap_err(),
            RegistryError::UnknownType("HearingDay".to_string())
        );
    }

    #[test]
    fn import_order_puts_first_types_first() {
        let reg = registry();
        let order: Vec<_> = reg
            .import_order()
            .iter()
            .map(|c| c.entity_type().to_string())
            .collect();
        assert_eq!(order, vec!["Appeal", "User", "Task", "TaskTimer"]);
    }

    #[test]
    fn tracked_types_listed() {
        let reg = registry();
        assert_eq!(
            reg.tracked_types(),
            vec![EntityType::new("Appeal"), EntityType::new("User")]
        );
        assert_eq!(reg.untracked_types().len(), 2);
    }
}
