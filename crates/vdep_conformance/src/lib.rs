//! Conformance test helpers for the vdep virtual-dependency engine.
//!
//! Provides model fixtures, a handler configured for a fixed namespace, and
//! helpers for inspecting an installed destination, shared by the
//! integration tests under `tests/`.

#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use vdep_common::ImportPath;
use vdep_config::{load_config_from_str, resolve_settings};
use vdep_engine::{EngineSettings, ReportInstaller, VirtualDependencyHandler};
use vdep_model::{Field, Model, ModelSnapshot, Module};
use walkdir::WalkDir;

/// Namespace every fixture generates into.
pub const NAMESPACE: &str = "__virtual__";

/// Shorthand for a valid import path.
pub fn ip(s: &str) -> ImportPath {
    ImportPath::new(s).unwrap()
}

/// Engine settings for [`NAMESPACE`] with every other value at its default.
pub fn settings() -> EngineSettings {
    EngineSettings::try_default()
        .unwrap()
        .with_namespace(ip(NAMESPACE))
}

/// Engine settings resolved from `vdep.toml` text against `project_root`.
pub fn settings_from_toml(toml: &str, project_root: &Path) -> EngineSettings {
    let config = load_config_from_str(toml).unwrap();
    let resolved = resolve_settings(&config, project_root).unwrap();
    EngineSettings::from(&resolved)
}

/// A handler using [`settings`].
pub fn handler() -> VirtualDependencyHandler {
    VirtualDependencyHandler::new(settings())
}

/// `m.models` defines abstract `Parent` and concrete `Child(Parent)` with a
/// foreign key to `n.models.Other`.
pub fn parent_child_snapshot() -> ModelSnapshot {
    let m = ip("m.models");
    let n = ip("n.models");
    ModelSnapshot::from_modules(
        vec!["m".to_string(), "n".to_string()],
        [
            Module::new(m.clone(), true)
                .with_model(Model::new(&m, "Parent").unwrap().into_abstract())
                .with_model(
                    Model::new(&m, "Child")
                        .unwrap()
                        .with_ancestor(ip("m.models.Parent"))
                        .with_field("name", Field::new(ip("fields.CharField")))
                        .with_field(
                            "other",
                            Field::related(ip("fields.ForeignKey"), ip("n.models.Other")),
                        ),
                ),
            Module::new(n.clone(), true).with_model(Model::new(&n, "Other").unwrap()),
        ],
    )
    .unwrap()
}

/// Three modules: `a.models` with no relations, `b.models` relating to
/// `a.models.Thing`, and `c.models` relating to nothing.
pub fn chain_snapshot() -> ModelSnapshot {
    let a = ip("a.models");
    let b = ip("b.models");
    let c = ip("c.models");
    ModelSnapshot::from_modules(
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        [
            Module::new(a.clone(), true).with_model(Model::new(&a, "Thing").unwrap()),
            Module::new(b.clone(), true).with_model(
                Model::new(&b, "Holder").unwrap().with_field(
                    "thing",
                    Field::related(ip("fields.ForeignKey"), ip("a.models.Thing")),
                ),
            ),
            Module::new(c.clone(), true).with_model(Model::new(&c, "Leaf").unwrap()),
        ],
    )
    .unwrap()
}

/// Where the artifact of `module` lands under `destination`.
pub fn artifact_path(
    handler: &VirtualDependencyHandler,
    destination: &Path,
    module: &ImportPath,
) -> PathBuf {
    let installer = ReportInstaller::new(handler.settings().extension.clone());
    destination.join(installer.relative_location(&handler.namer().name(module)))
}

/// Every file under `destination/<namespace>`, sorted.
pub fn namespace_files(destination: &Path, namespace: &str) -> Vec<PathBuf> {
    let root: PathBuf = destination.join(ip(namespace).segments().collect::<PathBuf>());
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Content and modification time of every file under the namespace.
pub fn snapshot_files(destination: &Path, namespace: &str) -> BTreeMap<PathBuf, (String, SystemTime)> {
    namespace_files(destination, namespace)
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path).unwrap();
            let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
            (path, (content, modified))
        })
        .collect()
}
