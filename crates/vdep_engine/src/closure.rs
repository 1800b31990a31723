//! Dependency closure: which virtual modules a file must be re-checked
//! against.
//!
//! Concrete-type facts flow along relation edges that cross module
//! boundaries, so a file touching module `A` depends on the artifact of every
//! module transitively related to `A`, not only the ones it imports.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use vdep_common::ImportPath;

use crate::report::Report;

/// A dependency entry in the consumer's `(priority, module, line)` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dep {
    /// Scheduling priority.
    pub priority: i32,
    /// The module depended on.
    pub module: ImportPath,
    /// Source line of the import, or `-1` when there is none.
    pub line: i32,
}

impl Dep {
    /// Creates a dependency with no source line.
    pub fn new(priority: i32, module: ImportPath) -> Self {
        Self {
            priority,
            module,
            line: -1,
        }
    }
}

/// Per-project knobs for closure queries.
#[derive(Debug, Clone)]
pub struct ClosureSettings {
    /// Namespace of the generated modules.
    pub virtual_namespace: ImportPath,
    /// Further namespaces whose files never receive extra dependencies.
    pub engine_namespaces: Vec<ImportPath>,
    /// Priority attached to every added dependency.
    pub priority: i32,
    /// Imports that imply a dependency on the settings module.
    pub settings_accessors: Vec<ImportPath>,
}

/// One closure query.
#[derive(Debug, Clone)]
pub struct DepsRequest {
    /// The module being analyzed.
    pub file_import_path: ImportPath,
    /// Fully qualified names the file imports.
    pub imports: Vec<ImportPath>,
    /// Dependencies the consumer already computed.
    pub super_deps: Vec<Dep>,
    /// The project's settings module, if any.
    pub settings_module: Option<ImportPath>,
}

impl Report {
    /// Expands `request` into every dependency the file needs.
    ///
    /// Files inside the virtual namespace or an engine namespace get their
    /// `super_deps` back unchanged. Otherwise the result is `super_deps` in
    /// their original order followed by the settings module (when the file
    /// reads settings) and then every virtual module reachable from the file,
    /// its imports, or its existing dependencies, sorted. No module appears
    /// twice.
    pub fn additional_deps(&self, request: &DepsRequest, settings: &ClosureSettings) -> Vec<Dep> {
        let file = &request.file_import_path;
        let excluded = std::iter::once(&settings.virtual_namespace)
            .chain(&settings.engine_namespaces)
            .any(|ns| file.is_within(ns));
        if excluded {
            return request.super_deps.clone();
        }

        let mut deps = request.super_deps.clone();
        let mut present: HashSet<ImportPath> = deps.iter().map(|d| d.module.clone()).collect();

        if let Some(settings_module) = &request.settings_module {
            let reads_settings = request.imports.iter().any(|imp| {
                imp == settings_module
                    || settings.settings_accessors.iter().any(|acc| imp.is_within(acc))
            });
            if reads_settings && present.insert(settings_module.clone()) {
                deps.push(Dep::new(settings.priority, settings_module.clone()));
            }
        }

        for virtual_path in self.reachable_virtual_modules(request) {
            if present.insert(virtual_path.clone()) {
                deps.push(Dep::new(settings.priority, virtual_path));
            }
        }

        deps
    }

    /// Fixed-point expansion over `related_import_paths`, starting from the
    /// file, the known modules its imports live in, and its existing
    /// dependencies.
    fn reachable_virtual_modules(&self, request: &DepsRequest) -> BTreeSet<ImportPath> {
        let mut pending: Vec<ImportPath> = Vec::new();
        pending.push(request.file_import_path.clone());
        for import in &request.imports {
            pending.extend(
                import
                    .prefixes()
                    .filter(|p| self.report_import_path.contains_key(p)),
            );
        }
        pending.extend(request.super_deps.iter().map(|d| d.module.clone()));

        let mut visited: HashSet<ImportPath> = HashSet::new();
        let mut found = BTreeSet::new();
        while let Some(module) = pending.pop() {
            if !visited.insert(module.clone()) {
                continue;
            }
            let Some(virtual_path) = self.report_import_path.get(&module) else {
                continue;
            };
            found.insert(virtual_path.clone());
            if let Some(related) = self.related_import_paths.get(&module) {
                pending.extend(related.iter().filter(|r| !visited.contains(*r)).cloned());
            }
        }
        found
    }
}
