//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::resolve::resolve_settings;
use crate::types::ProjectConfig;
use std::path::Path;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "vdep.toml";

/// Loads and validates a `vdep.toml` configuration from a project directory.
///
/// Reads `<project_dir>/vdep.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `vdep.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and every path resolves.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    resolve_settings(config, Path::new("."))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DifferentiatorMode;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "shop"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "shop");
        assert_eq!(config.virtual_deps.namespace, "__virtual_deps__");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "shop"
description = "Storefront"

[virtual]
namespace = "__shop_virtual__"
destination = "build/virtual"
extension = "pyi"
differentiator = "per-process"
generic_queryset = "orm.QuerySet"

[dependencies]
priority = 5
engine_namespaces = ["shop_plugin"]
settings_module = "shop.settings"
settings_accessors = ["django.conf.settings"]

[resolver]
search_paths = ["src"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.description, "Storefront");
        assert_eq!(config.virtual_deps.namespace, "__shop_virtual__");
        assert_eq!(config.virtual_deps.extension, "pyi");
        assert_eq!(
            config.virtual_deps.differentiator,
            DifferentiatorMode::PerProcess
        );
        assert_eq!(config.dependencies.priority, 5);
        assert_eq!(config.dependencies.engine_namespaces, vec!["shop_plugin"]);
        assert_eq!(config.resolver.search_paths, vec!["src"]);
    }

    #[test]
    fn missing_name_errors() {
        let err = load_config_from_str("[project]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_namespace_errors() {
        let toml = r#"
[project]
name = "shop"

[virtual]
namespace = "../escape"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidImportPath {
                field: "virtual.namespace",
                ..
            }
        ));
    }

    #[test]
    fn invalid_extension_errors() {
        let toml = r#"
[project]
name = "shop"

[virtual]
extension = "p/y"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[project]\nname = \"x\"\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "x");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/dir").join(CONFIG_FILE))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
