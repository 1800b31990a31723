//! One full analysis pass.
//!
//! The handler ties the stages together: build and render every module in
//! parallel, stage the artifacts in a scratch directory, install them,
//! combine the reports, and persist the combined report.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use vdep_common::{ContentHash, ImportPath};
use vdep_model::ModelGraph;

use crate::combine::{combine, CombinedReport};
use crate::dependency::{DifferentiatorPolicy, VirtualDependency};
use crate::error::EngineError;
use crate::installer::{InstallOutcome, ReportInstaller};
use crate::namer::VirtualDependencyNamer;
use crate::scribe::{VirtualDependencyScribe, WrittenVirtualDependency};
use crate::settings::EngineSettings;
use crate::store::ReportStore;
use crate::summary::{AnyOf, KnownModules, ModuleResolver, SearchPathResolver};

const SCRATCH_PREFIX: &str = ".vdep-scratch-";

/// A module whose artifact could not be produced.
#[derive(Debug)]
pub struct ModuleFailure {
    /// The module that failed.
    pub module: ImportPath,
    /// Why it failed.
    pub error: EngineError,
}

/// Result of a pass.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// The merged report of every module that succeeded.
    pub combined: CombinedReport,
    /// What the install step changed.
    pub install: InstallOutcome,
    /// Modules that failed, sorted by module path.
    pub failures: Vec<ModuleFailure>,
}

/// Runs analysis passes for one project.
#[derive(Debug, Clone)]
pub struct VirtualDependencyHandler {
    settings: EngineSettings,
    namer: VirtualDependencyNamer,
    scribe: VirtualDependencyScribe,
    differentiator: DifferentiatorPolicy,
}

impl VirtualDependencyHandler {
    /// Creates a handler. A per-process differentiator token is fixed here.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            namer: VirtualDependencyNamer::new(settings.namespace.clone()),
            scribe: VirtualDependencyScribe::new(settings.generic_queryset.clone()),
            differentiator: DifferentiatorPolicy::from_mode(settings.differentiator),
            settings,
        }
    }

    /// Overrides the differentiator policy.
    pub fn with_differentiator(mut self, differentiator: DifferentiatorPolicy) -> Self {
        self.differentiator = differentiator;
        self
    }

    /// The settings this handler was built with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The namer used for every module.
    pub fn namer(&self) -> &VirtualDependencyNamer {
        &self.namer
    }

    /// Builds and renders every module of `graph`.
    ///
    /// Modules are processed in parallel. A module whose facts cannot be
    /// looked up is reported as a failure without stopping the others.
    /// Both lists come back in module order.
    pub fn generate<G>(&self, graph: &G) -> (Vec<WrittenVirtualDependency>, Vec<ModuleFailure>)
    where
        G: ModelGraph + ?Sized,
    {
        let installed_apps_hash = ContentHash::from_parts(graph.installed_apps());
        let modules = graph.modules();

        let results: Vec<Result<WrittenVirtualDependency, ModuleFailure>> = modules
            .par_iter()
            .map(|module| {
                VirtualDependency::create(
                    module,
                    graph,
                    &self.namer,
                    installed_apps_hash,
                    &self.differentiator,
                )
                .map_err(EngineError::from)
                .and_then(|vd| self.scribe.write(&vd))
                .map_err(|error| ModuleFailure {
                    module: module.import_path.clone(),
                    error,
                })
            })
            .collect();

        let mut written = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(w) => written.push(w),
                Err(failure) => {
                    warn!(module = %failure.module, error = %failure.error, "skipping module");
                    failures.push(failure);
                }
            }
        }
        (written, failures)
    }

    /// Runs a full pass against `destination`.
    ///
    /// An on-disk artifact counts as live if its module is part of `graph` or
    /// exists under one of the configured search paths. Artifacts of modules
    /// that failed this pass are therefore kept as they were.
    pub fn make_report<G>(
        &self,
        graph: &G,
        destination: &Path,
    ) -> Result<GenerationOutcome, EngineError>
    where
        G: ModelGraph + ?Sized,
    {
        let known = KnownModules::new(graph.modules().iter().map(|m| m.import_path.clone()));
        if self.settings.search_paths.is_empty() {
            self.make_report_with_resolver(graph, destination, &known)
        } else {
            let search = SearchPathResolver::new(
                self.settings.search_paths.clone(),
                self.settings.extension.clone(),
            );
            self.make_report_with_resolver(graph, destination, &AnyOf(known, search))
        }
    }

    /// Runs a full pass, deciding which on-disk artifacts are live with
    /// `resolver`.
    pub fn make_report_with_resolver<G, R>(
        &self,
        graph: &G,
        destination: &Path,
        resolver: &R,
    ) -> Result<GenerationOutcome, EngineError>
    where
        G: ModelGraph + ?Sized,
        R: ModuleResolver + ?Sized,
    {
        let (written, failures) = self.generate(graph);

        std::fs::create_dir_all(destination).map_err(|e| EngineError::io(destination, e))?;
        sweep_stale_scratch(destination)?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(destination)
            .map_err(|e| EngineError::io(destination, e))?;
        debug!(scratch = %scratch.path().display(), "staging artifacts");

        let mut installer = ReportInstaller::new(self.settings.extension.clone());
        for w in &written {
            installer.write_report(
                scratch.path(),
                &w.virtual_import_path,
                &w.content,
                w.summary_hash.clone(),
            )?;
        }
        let install = installer.install_reports(
            scratch.path(),
            destination,
            &self.settings.namespace,
            resolver,
        )?;
        drop(scratch);

        let combined = combine(&written)?;
        ReportStore::new(destination).save(&combined)?;

        info!(
            modules = written.len(),
            installed = install.installed.len(),
            unchanged = install.unchanged.len(),
            removed = install.removed.len(),
            failures = failures.len(),
            version = %combined.version,
            "generated virtual dependencies"
        );

        Ok(GenerationOutcome {
            combined,
            install,
            failures,
        })
    }
}

/// Removes scratch directories left behind by passes that never finished.
fn sweep_stale_scratch(destination: &Path) -> Result<(), EngineError> {
    let entries = std::fs::read_dir(destination).map_err(|e| EngineError::io(destination, e))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let stale = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(SCRATCH_PREFIX))
            && path.is_dir();
        if stale {
            warn!(path = %path.display(), "removing leftover scratch directory");
            std::fs::remove_dir_all(&path).map_err(|e| EngineError::io(&path, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdep_model::{Field, Model, ModelSnapshot, Module};

    fn ip(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    fn handler() -> VirtualDependencyHandler {
        VirtualDependencyHandler::new(
            EngineSettings::try_default()
                .unwrap()
                .with_namespace(ip("__virtual__")),
        )
    }

    fn snapshot() -> ModelSnapshot {
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

    #[test]
    fn generate_keeps_module_order() {
        let (written, failures) = handler().generate(&snapshot());
        assert!(failures.is_empty());
        let modules: Vec<_> = written
            .iter()
            .map(|w| {
                w.report
                    .report_import_path
                    .keys()
                    .next()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(modules, vec!["m.models", "n.models"]);
    }

    #[test]
    fn make_report_installs_and_persists() {
        let dest = tempfile::tempdir().unwrap();
        let h = handler();
        let outcome = h.make_report(&snapshot(), dest.path()).unwrap();
        assert_eq!(outcome.install.installed.len(), 2);
        assert!(outcome.failures.is_empty());

        let vpath = h.namer().name(&ip("m.models"));
        let file = dest
            .path()
            .join("__virtual__")
            .join(format!("{}.py", vpath.name()));
        assert!(file.is_file());

        let stored = ReportStore::new(dest.path()).load().unwrap();
        assert_eq!(stored, outcome.combined);
    }

    #[test]
    fn scratch_directory_is_cleaned_up() {
        let dest = tempfile::tempdir().unwrap();
        handler().make_report(&snapshot(), dest.path()).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dest.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".vdep-scratch-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn leftover_scratch_from_interrupted_pass_is_swept() {
        let dest = tempfile::tempdir().unwrap();
        let leftover = dest.path().join(".vdep-scratch-crashed");
        std::fs::create_dir_all(leftover.join("__virtual__")).unwrap();
        std::fs::write(leftover.join("__virtual__/mod_x.py"), "mod = \"x\"\n").unwrap();
        let unrelated = dest.path().join(".cache");
        std::fs::create_dir_all(&unrelated).unwrap();

        handler().make_report(&snapshot(), dest.path()).unwrap();
        assert!(!leftover.exists());
        assert!(unrelated.is_dir());
    }

    #[test]
    fn rerun_changes_nothing() {
        let dest = tempfile::tempdir().unwrap();
        let h = handler();
        let first = h.make_report(&snapshot(), dest.path()).unwrap();
        let second = h.make_report(&snapshot(), dest.path()).unwrap();
        assert!(second.install.is_noop());
        assert_eq!(first.combined.version, second.combined.version);
    }

    #[test]
    fn failing_module_does_not_abort_pass() {
        let m = ip("m.models");
        let snapshot = ModelSnapshot::from_modules(
            vec![],
            [Module::new(m.clone(), true).with_model(Model::new(&m, "Ghost").unwrap())],
        )
        .unwrap()
        .with_concrete(
            [(ip("m.models.Ghost"), vec![ip("gone.models.Missing")])]
                .into_iter()
                .collect(),
        );
        let dest = tempfile::tempdir().unwrap();
        let outcome = handler().make_report(&snapshot, dest.path()).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].module, m);
        assert!(outcome.combined.report.report_import_path.is_empty());
    }
}
