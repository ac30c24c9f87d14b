//! Per-type export/import configuration

use crate::retrieval::Retrieval;
use sjx_sanitize::SanitizeSpec;
use sjx_schema::EntityType;
use sjx_store::CreationMode;

/// Natural key used to find an existing record instead of importing a copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseKey {
    fields: Vec<String>,
}

impl ReuseKey {
    /// Single-field key (e.g. `css_id`)
    #[must_use]
    pub fn field(name: &str) -> Self {
        Self {
            fields: vec![name.to_string()],
        }
    }

    /// Composite key (e.g. `organization_id` + `user_id`)
    #[must_use]
    pub fn composite(names: &[&str]) -> Self {
        Self {
            fields: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    /// Key fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Everything the exporter and importer know about one entity type
#[derive(Debug, Clone)]
pub struct TypeConfig {
    entity_type: EntityType,
    retrieval: Option<Retrieval>,
    sanitize: SanitizeSpec,
    tracked: bool,
    reuse_key: Option<ReuseKey>,
    creation_mode: CreationMode,
}

impl TypeConfig {
    /// Type with no rule, no sensitive fields, untracked, checked creation
    #[must_use]
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: EntityType::new(entity_type),
            retrieval: None,
            sanitize: SanitizeSpec::new(),
            tracked: false,
            reuse_key: None,
            creation_mode: CreationMode::Checked,
        }
    }

    /// Set retrieval rule
    #[must_use]
    pub fn retrieve(mut self, rule: Retrieval) -> Self {
        self.retrieval = Some(rule);
        self
    }

    /// Set sanitize spec
    #[must_use]
    pub fn sanitize(mut self, spec: SanitizeSpec) -> Self {
        self.sanitize = spec;
        self
    }

    /// Record original to new id mappings on import
    #[must_use]
    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }

    /// Reuse an existing target record matching this key
    #[must_use]
    pub fn reuse_by(mut self, key: ReuseKey) -> Self {
        self.reuse_key = Some(key);
        self
    }

    /// Create without validation or callbacks
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.creation_mode = CreationMode::Raw;
        self
    }

    /// Entity type
    #[inline]
    #[must_use]
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Retrieval rule, if any
    #[inline]
    #[must_use]
    pub fn retrieval(&self) -> Option<&Retrieval> {
        self.retrieval.as_ref()
    }

    /// Sanitize spec
    #[inline]
    #[must_use]
    pub fn sanitize_spec(&self) -> &SanitizeSpec {
        &self.sanitize
    }

    /// Whether ids are tracked
    #[inline]
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Reuse key, if the type is reused when found
    #[inline]
    #[must_use]
    pub fn reuse_key(&self) -> Option<&ReuseKey> {
        self.reuse_key.as_ref()
    }

    /// Creation mode
    #[inline]
    #[must_use]
    pub fn creation_mode(&self) -> CreationMode {
        self.creation_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TypeConfig::new("Veteran");
        assert_eq!(config.entity_type().as_str(), "Veteran");
        assert!(config.retrieval().is_none());
        assert!(!config.is_tracked());
        assert!(config.reuse_key().is_none());
        assert_eq!(config.creation_mode(), CreationMode::Checked);
    }

    #[test]
    fn builders() {
        let config = TypeConfig::new("OrganizationsUser")
            .retrieve(Retrieval::has_many("User", "user_id"))
            .reuse_by(ReuseKey::composite(&["organization_id", "user_id"]))
            .raw();
        assert_eq!(
            config.reuse_key().map(ReuseKey::fields),
            Some(&["organization_id".to_string(), "user_id".to_string()][..])
        );
        assert_eq!(config.creation_mode(), CreationMode::Raw);
        assert!(config.retrieval().is_some());
    }
}
