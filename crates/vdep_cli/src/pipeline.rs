//! Shared pipeline helpers for CLI commands.
//!
//! Project root discovery, configuration loading, and access to the report
//! snapshot written by the last `vdep generate`.

use std::path::{Path, PathBuf};

use vdep_config::{load_config_from_str, resolve_settings, ResolvedSettings, CONFIG_FILE};
use vdep_engine::{CombinedReport, EngineSettings, ReportStore};

use crate::GlobalArgs;

/// A loaded project: where it lives and how the engine is configured.
pub struct Project {
    /// Directory containing the configuration file.
    pub root: PathBuf,
    /// Validated configuration with absolute paths.
    pub resolved: ResolvedSettings,
    /// Settings handed to the engine.
    pub engine: EngineSettings,
}

/// Walks up from `start` looking for the nearest directory containing `vdep.toml`.
///
/// Returns the directory containing `vdep.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Locates the configuration file from global CLI args.
///
/// If `--config` names a file, that file is used. If it names a directory,
/// `vdep.toml` inside it is used. Otherwise walks up from the current
/// directory.
pub fn resolve_config_file(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_dir() {
            Ok(p.join(CONFIG_FILE))
        } else {
            Ok(p)
        }
    } else {
        Ok(find_project_root(&std::env::current_dir()?)?.join(CONFIG_FILE))
    }
}

/// Loads and resolves the project configuration.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let config_file = resolve_config_file(global)?;
    load_project_from(&config_file)
}

/// Loads and resolves the configuration at `config_file`. Relative paths in it
/// are taken from the file's directory.
pub fn load_project_from(config_file: &Path) -> Result<Project, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(config_file)
        .map_err(|e| format!("cannot read {}: {e}", config_file.display()))?;
    let config = load_config_from_str(&content)?;

    let root = match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let resolved = resolve_settings(&config, &root)?;
    let engine = EngineSettings::from(&resolved);
    Ok(Project {
        root,
        resolved,
        engine,
    })
}

/// Reads the report snapshot of the project's destination.
///
/// Fails with a hint when there is no usable snapshot.
pub fn load_combined_report(project: &Project) -> Result<CombinedReport, Box<dyn std::error::Error>> {
    let store = ReportStore::new(&project.resolved.destination);
    store.load().ok_or_else(|| {
        format!(
            "no usable report at {}; run `vdep generate` first",
            store.path().display()
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL: &str = "[project]\nname = \"shop\"\n";

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: false,
            verbose: false,
            config: config.map(|p| p.to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vdep.toml"), MINIMAL).unwrap();
        let root = find_project_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vdep.toml"), MINIMAL).unwrap();
        let sub = tmp.path().join("shop").join("views");
        fs::create_dir_all(&sub).unwrap();
        let root = find_project_root(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = find_project_root(tmp.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("could not find vdep.toml"));
    }

    #[test]
    fn resolve_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, MINIMAL).unwrap();
        assert_eq!(resolve_config_file(&global(Some(&path))).unwrap(), path);
    }

    #[test]
    fn resolve_config_from_dir() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolve_config_file(&global(Some(tmp.path()))).unwrap();
        assert_eq!(resolved, tmp.path().join("vdep.toml"));
    }

    #[test]
    fn load_project_resolves_destination() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("vdep.toml"),
            "[project]\nname = \"shop\"\n\n[virtual]\ndestination = \"out\"\nnamespace = \"__shop__\"\n",
        )
        .unwrap();
        let project = load_project(&global(Some(tmp.path()))).unwrap();
        assert_eq!(project.root, tmp.path());
        assert_eq!(project.resolved.destination, tmp.path().join("out"));
        assert_eq!(project.engine.namespace.as_str(), "__shop__");
    }

    #[test]
    fn load_project_reports_invalid_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vdep.toml"), "[project]\nname = \"\"\n").unwrap();
        assert!(load_project(&global(Some(tmp.path()))).is_err());
    }

    #[test]
    fn missing_report_has_hint() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vdep.toml"), MINIMAL).unwrap();
        let project = load_project(&global(Some(tmp.path()))).unwrap();
        let err = load_combined_report(&project).unwrap_err();
        assert!(err.to_string().contains("run `vdep generate` first"));
    }
}
