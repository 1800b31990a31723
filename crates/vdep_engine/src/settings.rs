//! Engine settings threaded through every pass.

use std::path::PathBuf;

use vdep_common::{ImportPath, InvalidImportPath};
use vdep_config::{DifferentiatorMode, ResolvedSettings};

use crate::closure::ClosureSettings;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "__virtual_deps__";

/// Generic queryset used when none is configured.
pub const DEFAULT_GENERIC_QUERYSET: &str = "django.db.models.QuerySet";

/// Everything the engine needs to know about a project.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Namespace every virtual module lives under.
    pub namespace: ImportPath,
    /// Artifact file extension.
    pub extension: String,
    /// Interface marker policy.
    pub differentiator: DifferentiatorMode,
    /// Generic queryset type for descendants without a custom queryset.
    pub generic_queryset: ImportPath,
    /// Priority of dependencies added by the closure.
    pub priority: i32,
    /// Namespaces excluded from the closure.
    pub engine_namespaces: Vec<ImportPath>,
    /// Settings module reported to the closure.
    pub settings_module: Option<ImportPath>,
    /// Imports that imply a settings dependency.
    pub settings_accessors: Vec<ImportPath>,
    /// Source roots consulted when deciding whether an artifact is stale.
    pub search_paths: Vec<PathBuf>,
}

impl EngineSettings {
    /// Default settings.
    pub fn try_default() -> Result<Self, InvalidImportPath> {
        Ok(Self {
            namespace: ImportPath::new(DEFAULT_NAMESPACE)?,
            extension: "py".to_string(),
            differentiator: DifferentiatorMode::Content,
            generic_queryset: ImportPath::new(DEFAULT_GENERIC_QUERYSET)?,
            priority: 10,
            engine_namespaces: Vec::new(),
            settings_module: None,
            settings_accessors: Vec::new(),
            search_paths: Vec::new(),
        })
    }

    /// Replaces the namespace.
    pub fn with_namespace(mut self, namespace: ImportPath) -> Self {
        self.namespace = namespace;
        self
    }

    /// The subset of settings closure queries need.
    pub fn closure_settings(&self) -> ClosureSettings {
        ClosureSettings {
            virtual_namespace: self.namespace.clone(),
            engine_namespaces: self.engine_namespaces.clone(),
            priority: self.priority,
            settings_accessors: self.settings_accessors.clone(),
        }
    }
}

impl From<&ResolvedSettings> for EngineSettings {
    fn from(resolved: &ResolvedSettings) -> Self {
        Self {
            namespace: resolved.namespace.clone(),
            extension: resolved.extension.clone(),
            differentiator: resolved.differentiator,
            generic_queryset: resolved.generic_queryset.clone(),
            priority: resolved.priority,
            engine_namespaces: resolved.engine_namespaces.clone(),
            settings_module: resolved.settings_module.clone(),
            settings_accessors: resolved.settings_accessors.clone(),
            search_paths: resolved.search_paths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vdep_config::{load_config_from_str, resolve_settings};

    #[test]
    fn defaults_are_valid() {
        let settings = EngineSettings::try_default().unwrap();
        assert_eq!(settings.namespace.as_str(), DEFAULT_NAMESPACE);
        assert_eq!(settings.extension, "py");
        assert_eq!(settings.priority, 10);
    }

    #[test]
    fn from_resolved_config() {
        let config = load_config_from_str(
            r#"
[project]
name = "shop"

[virtual]
namespace = "__shop__"
extension = "pyi"

[dependencies]
priority = 3
engine_namespaces = ["shop_plugin"]
settings_module = "shop.settings"
"#,
        )
        .unwrap();
        let resolved = resolve_settings(&config, Path::new("/p")).unwrap();
        let settings = EngineSettings::from(&resolved);
        assert_eq!(settings.namespace.as_str(), "__shop__");
        assert_eq!(settings.extension, "pyi");

        let closure = settings.closure_settings();
        assert_eq!(closure.priority, 3);
        assert_eq!(closure.virtual_namespace.as_str(), "__shop__");
        assert_eq!(closure.engine_namespaces.len(), 1);
    }
}
