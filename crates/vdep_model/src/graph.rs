//! The model graph collaborator interface.

use std::collections::BTreeMap;

use vdep_common::ImportPath;

use crate::error::ModelError;
use crate::model::{Model, Module};

/// Concrete descendants keyed by the model they descend from.
pub type ConcreteModelsMap = BTreeMap<ImportPath, Vec<Model>>;

/// Supplies module, model, and field facts plus concrete-descendant lookups.
///
/// Implementations must be shareable across threads; the engine fans module
/// processing out over a thread pool.
pub trait ModelGraph: Sync {
    /// All modules known to the graph, sorted by import path.
    fn modules(&self) -> Vec<&Module>;

    /// The installed application labels, in their configured order.
    fn installed_apps(&self) -> &[String];

    /// Non-abstract models that are `parent` or descend from it, sorted by
    /// import path.
    fn concrete_models(&self, parent: &ImportPath) -> Result<Vec<Model>, ModelError>;
}
