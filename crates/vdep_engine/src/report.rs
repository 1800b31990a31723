//! Per-module reports: alias registrations and the module relation graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vdep_common::ImportPath;
use vdep_model::Model;

/// What one or more artifacts tell the consumer.
///
/// `related_import_paths` is a symmetric adjacency map between real modules:
/// whenever `a` lists `b`, `b` lists `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Model path → alias naming the union of its concrete descendants.
    pub concrete_annotations: BTreeMap<ImportPath, ImportPath>,
    /// Model path → alias naming the union of its descendants' querysets.
    pub concrete_querysets: BTreeMap<ImportPath, ImportPath>,
    /// Real module path → virtual module path.
    pub report_import_path: BTreeMap<ImportPath, ImportPath>,
    /// Real module path → real modules it is related to.
    pub related_import_paths: BTreeMap<ImportPath, BTreeSet<ImportPath>>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records which virtual module describes `module_import_path`.
    pub fn register_module(
        &mut self,
        module_import_path: &ImportPath,
        virtual_import_path: &ImportPath,
    ) {
        self.report_import_path
            .insert(module_import_path.clone(), virtual_import_path.clone());
    }

    /// Records the aliases emitted for `model_import_path` and relates its
    /// module to every module its concrete descendants touch.
    ///
    /// A descendant touches its own module, the module of its custom
    /// queryset, the module of every related model, and the module of every
    /// ancestor.
    pub fn register_model(
        &mut self,
        model_import_path: &ImportPath,
        concrete_alias: ImportPath,
        queryset_alias: ImportPath,
        concrete_models: &[Model],
    ) {
        self.concrete_annotations
            .insert(model_import_path.clone(), concrete_alias);
        self.concrete_querysets
            .insert(model_import_path.clone(), queryset_alias);

        let Some(module) = model_import_path.parent() else {
            return;
        };

        for concrete in concrete_models {
            let touched = std::iter::once(&concrete.import_path)
                .chain(concrete.default_custom_queryset.as_ref())
                .chain(concrete.related_models())
                .chain(concrete.ancestors.iter());
            for path in touched {
                if let Some(other) = path.parent() {
                    self.relate(&module, other);
                }
            }
        }
    }

    fn relate(&mut self, a: &ImportPath, b: ImportPath) {
        if *a == b {
            return;
        }
        self.related_import_paths
            .entry(b.clone())
            .or_default()
            .insert(a.clone());
        self.related_import_paths
            .entry(a.clone())
            .or_default()
            .insert(b);
    }

    /// Looks up the concrete alias for each model.
    pub fn get_concrete_aliases<'a>(
        &self,
        models: impl IntoIterator<Item = &'a ImportPath>,
    ) -> BTreeMap<ImportPath, Option<ImportPath>> {
        lookup(&self.concrete_annotations, models)
    }

    /// Looks up the concrete queryset alias for each model.
    pub fn get_queryset_aliases<'a>(
        &self,
        models: impl IntoIterator<Item = &'a ImportPath>,
    ) -> BTreeMap<ImportPath, Option<ImportPath>> {
        lookup(&self.concrete_querysets, models)
    }
}

fn lookup<'a>(
    table: &BTreeMap<ImportPath, ImportPath>,
    models: impl IntoIterator<Item = &'a ImportPath>,
) -> BTreeMap<ImportPath, Option<ImportPath>> {
    models
        .into_iter()
        .map(|m| (m.clone(), table.get(m).cloned()))
        .collect()
}
