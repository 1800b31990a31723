//! Settings resolution: turning raw configuration strings into typed values.

use crate::error::ConfigError;
use crate::types::{DifferentiatorMode, ProjectConfig};
use std::path::{Path, PathBuf};
use vdep_common::ImportPath;

/// A fully resolved configuration with validated import paths and
/// destination/search paths anchored at the project root.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// The project name.
    pub name: String,
    /// Namespace every virtual module lives under.
    pub namespace: ImportPath,
    /// Absolute (or project-root-joined) destination directory.
    pub destination: PathBuf,
    /// Artifact file extension.
    pub extension: String,
    /// Interface marker policy.
    pub differentiator: DifferentiatorMode,
    /// Generic queryset type for descendants without a custom queryset.
    pub generic_queryset: ImportPath,
    /// Priority attached to dependencies added by the closure.
    pub priority: i32,
    /// Namespaces excluded from the closure.
    pub engine_namespaces: Vec<ImportPath>,
    /// The settings module, if any.
    pub settings_module: Option<ImportPath>,
    /// Imports that imply a settings dependency.
    pub settings_accessors: Vec<ImportPath>,
    /// Source roots used to check whether an artifact's module still exists.
    pub search_paths: Vec<PathBuf>,
}

/// Resolves a parsed configuration relative to `project_root`.
///
/// Every import path is validated and every relative filesystem path is
/// joined onto `project_root`.
pub fn resolve_settings(
    config: &ProjectConfig,
    project_root: &Path,
) -> Result<ResolvedSettings, ConfigError> {
    let v = &config.virtual_deps;
    let d = &config.dependencies;

    if v.extension.is_empty() || !v.extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::ValidationError(format!(
            "virtual.extension '{}' must be a non-empty alphanumeric string",
            v.extension
        )));
    }

    let engine_namespaces = d
        .engine_namespaces
        .iter()
        .map(|ns| import_path("dependencies.engine_namespaces", ns))
        .collect::<Result<Vec<_>, _>>()?;
    let settings_accessors = d
        .settings_accessors
        .iter()
        .map(|ns| import_path("dependencies.settings_accessors", ns))
        .collect::<Result<Vec<_>, _>>()?;
    let settings_module = match d.settings_module.as_deref() {
        None | Some("") => None,
        Some(m) => Some(import_path("dependencies.settings_module", m)?),
    };

    Ok(ResolvedSettings {
        name: config.project.name.clone(),
        namespace: import_path("virtual.namespace", &v.namespace)?,
        destination: project_root.join(&v.destination),
        extension: v.extension.clone(),
        differentiator: v.differentiator,
        generic_queryset: import_path("virtual.generic_queryset", &v.generic_queryset)?,
        priority: d.priority,
        engine_namespaces,
        settings_module,
        settings_accessors,
        search_paths: config
            .resolver
            .search_paths
            .iter()
            .map(|p| project_root.join(p))
            .collect(),
    })
}

fn import_path(field: &'static str, value: &str) -> Result<ImportPath, ConfigError> {
    ImportPath::new(value).map_err(|source| ConfigError::InvalidImportPath { field, source })
}
