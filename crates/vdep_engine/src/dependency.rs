//! Per-module fact summaries.
//!
//! A [`VirtualDependency`] captures everything the scribe needs to render one
//! module's artifact: which concrete models descend from each model the
//! module defines, and a summary whose hash changes exactly when those facts
//! change.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use vdep_common::{short_hash, ContentHash, ImportPath};
use vdep_config::DifferentiatorMode;
use vdep_model::{ConcreteModelsMap, ModelError, ModelGraph, Module};

use crate::namer::VirtualDependencyNamer;

/// Whether a module's facts were hashed.
///
/// Uninstalled modules cannot be imported safely, so nothing about them is
/// hashed and both hashes are absent together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryState {
    /// The module is installed and its facts were hashed.
    Installed {
        /// Hash of the installed application list.
        installed_apps_hash: ContentHash,
        /// Hash of every path that affects the module's artifact.
        significant_objects_hash: ContentHash,
    },
    /// The module is not installed.
    NotInstalled,
}

/// Identity and change-detection hashes for one virtual dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDependencySummary {
    /// The virtual module path.
    pub virtual_name: ImportPath,
    /// The real module this summary describes.
    pub module_import_path: ImportPath,
    /// Installed hashes, or the lack of them.
    pub state: SummaryState,
}

impl VirtualDependencySummary {
    /// Returns the summary string written into the artifact, or `None` when
    /// the module is not installed.
    ///
    /// Format: `<virtual>::<module>::installed_apps=<hash>::significant=<hash>`.
    pub fn summary_hash(&self) -> Option<String> {
        match self.state {
            SummaryState::Installed {
                installed_apps_hash,
                significant_objects_hash,
            } => Some(format!(
                "{}::{}::installed_apps={installed_apps_hash}::significant={significant_objects_hash}",
                self.virtual_name, self.module_import_path
            )),
            SummaryState::NotInstalled => None,
        }
    }
}

/// How the interface marker in each artifact is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DifferentiatorPolicy {
    /// Derive the marker from the summary hash.
    Content,
    /// Use the same marker for every artifact written by this process.
    PerProcess(String),
}

impl DifferentiatorPolicy {
    /// Builds a per-process policy from the current wall-clock time.
    pub fn per_process() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::PerProcess(format!("{}_{:09}", now.as_secs(), now.subsec_nanos()))
    }

    /// Builds the policy selected by configuration.
    pub fn from_mode(mode: DifferentiatorMode) -> Self {
        match mode {
            DifferentiatorMode::Content => Self::Content,
            DifferentiatorMode::PerProcess => Self::per_process(),
        }
    }

    /// Returns the marker token for `summary`, or `None` for uninstalled modules.
    pub fn token(&self, summary: &VirtualDependencySummary) -> Option<String> {
        let hash = summary.summary_hash()?;
        match self {
            Self::Content => Some(format!("{:016x}", short_hash(hash.as_bytes()))),
            Self::PerProcess(token) => Some(token.clone()),
        }
    }
}

impl Default for DifferentiatorPolicy {
    fn default() -> Self {
        Self::Content
    }
}

/// The facts about one module that drive its artifact.
#[derive(Debug, Clone)]
pub struct VirtualDependency {
    /// The module being described.
    pub module: Module,
    /// Token naming the interface marker; `None` renders `interface__empty__`.
    pub interface_differentiator: Option<String>,
    /// Identity and change-detection hashes.
    pub summary: VirtualDependencySummary,
    /// Models, custom querysets, and related models referenced by the module,
    /// sorted.
    pub all_related_models: Vec<ImportPath>,
    /// Concrete descendants of every model the module defines.
    pub concrete_models: ConcreteModelsMap,
}

impl VirtualDependency {
    /// Computes the virtual dependency for `module`.
    ///
    /// Uninstalled modules get the [`SummaryState::NotInstalled`] summary and
    /// no related or concrete models; the graph is not consulted for them.
    pub fn create<G>(
        module: &Module,
        graph: &G,
        namer: &VirtualDependencyNamer,
        installed_apps_hash: ContentHash,
        differentiator: &DifferentiatorPolicy,
    ) -> Result<Self, ModelError>
    where
        G: ModelGraph + ?Sized,
    {
        let virtual_name = namer.name(&module.import_path);

        if !module.installed {
            return Ok(Self {
                module: module.clone(),
                interface_differentiator: None,
                summary: VirtualDependencySummary {
                    virtual_name,
                    module_import_path: module.import_path.clone(),
                    state: SummaryState::NotInstalled,
                },
                all_related_models: Vec::new(),
                concrete_models: ConcreteModelsMap::new(),
            });
        }

        let mut related: BTreeSet<&ImportPath> = BTreeSet::new();
        let mut querysets: BTreeSet<&ImportPath> = BTreeSet::new();
        let mut concrete_models = ConcreteModelsMap::new();

        for model in module.models.values() {
            related.insert(&model.import_path);
            if let Some(queryset) = &model.default_custom_queryset {
                related.insert(queryset);
                querysets.insert(queryset);
            }
            related.extend(model.related_models());
            concrete_models.insert(
                model.import_path.clone(),
                graph.concrete_models(&model.import_path)?,
            );
        }

        // Descendants are rendered as aliases, so they are significant even
        // though they live in other modules and are not related models.
        let mut descendants: BTreeSet<&ImportPath> = BTreeSet::new();
        for concrete in concrete_models.values().flatten() {
            descendants.insert(&concrete.import_path);
            if let Some(queryset) = &concrete.default_custom_queryset {
                querysets.insert(queryset);
            }
        }

        let significant: BTreeSet<&ImportPath> = related
            .iter()
            .chain(&querysets)
            .chain(&descendants)
            .copied()
            .collect();
        let significant_objects_hash =
            ContentHash::from_parts(significant.iter().map(|p| p.as_str()));

        let summary = VirtualDependencySummary {
            virtual_name,
            module_import_path: module.import_path.clone(),
            state: SummaryState::Installed {
                installed_apps_hash,
                significant_objects_hash,
            },
        };

        Ok(Self {
            module: module.clone(),
            interface_differentiator: differentiator.token(&summary),
            summary,
            all_related_models: related.into_iter().cloned().collect(),
            concrete_models,
        })
    }
}
