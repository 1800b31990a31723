//! An in-memory model graph loaded from a JSON document.
//!
//! The document shape is:
//!
//! ```json
//! {
//!   "installed_apps": ["app"],
//!   "modules": [
//!     {
//!       "import_path": "app.models",
//!       "installed": true,
//!       "models": [
//!         {
//!           "name": "Child",
//!           "is_abstract": false,
//!           "default_custom_queryset": null,
//!           "ancestors": ["app.models.Parent"],
//!           "fields": { "other": { "field_type": "fields.ForeignKey", "related_model": "other.models.Other" } }
//!         }
//!       ]
//!     }
//!   ],
//!   "concrete": { "app.models.Parent": ["app.models.Child"] }
//! }
//! ```
//!
//! `concrete` is optional. When absent, descendants are derived from each
//! model's `ancestors`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use vdep_common::ImportPath;

use crate::error::ModelError;
use crate::graph::ModelGraph;
use crate::model::{Field, Model, Module};

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    installed_apps: Vec<String>,
    #[serde(default)]
    modules: Vec<RawModule>,
    #[serde(default)]
    concrete: Option<BTreeMap<ImportPath, Vec<ImportPath>>>,
}

#[derive(Deserialize)]
struct RawModule {
    import_path: ImportPath,
    #[serde(default = "default_installed")]
    installed: bool,
    #[serde(default)]
    models: Vec<RawModel>,
}

#[derive(Deserialize)]
struct RawModel {
    name: String,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    default_custom_queryset: Option<ImportPath>,
    #[serde(default)]
    ancestors: Vec<ImportPath>,
    #[serde(default)]
    fields: BTreeMap<String, Field>,
}

fn default_installed() -> bool {
    true
}

/// A [`ModelGraph`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct ModelSnapshot {
    installed_apps: Vec<String>,
    modules: BTreeMap<ImportPath, Module>,
    all_models: BTreeMap<ImportPath, Model>,
    concrete: Option<BTreeMap<ImportPath, Vec<ImportPath>>>,
}

impl ModelSnapshot {
    /// Builds a snapshot from already-constructed modules.
    ///
    /// Fails if two modules claim the same model path.
    pub fn from_modules(
        installed_apps: Vec<String>,
        modules: impl IntoIterator<Item = Module>,
    ) -> Result<Self, ModelError> {
        let mut snapshot = Self {
            installed_apps,
            ..Self::default()
        };
        for module in modules {
            snapshot.insert_module(module)?;
        }
        Ok(snapshot)
    }

    /// Parses a snapshot from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        let raw: RawSnapshot =
            serde_json::from_str(content).map_err(|e| ModelError::Parse(e.to_string()))?;

        let mut modules = Vec::with_capacity(raw.modules.len());
        for raw_module in raw.modules {
            let mut module = Module::new(raw_module.import_path, raw_module.installed);
            for raw_model in raw_module.models {
                let mut model = Model::new(&module.import_path, &raw_model.name)?;
                model.is_abstract = raw_model.is_abstract;
                model.default_custom_queryset = raw_model.default_custom_queryset;
                model.ancestors = raw_model.ancestors;
                model.fields = raw_model.fields;
                module = module.with_model(model);
            }
            modules.push(module);
        }

        let mut snapshot = Self::from_modules(raw.installed_apps, modules)?;
        snapshot.concrete = raw.concrete;
        Ok(snapshot)
    }

    /// Reads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Overrides descendant lookup with an explicit table.
    pub fn with_concrete(mut self, concrete: BTreeMap<ImportPath, Vec<ImportPath>>) -> Self {
        self.concrete = Some(concrete);
        self
    }

    /// Returns the model at `path`, if known.
    pub fn model(&self, path: &ImportPath) -> Option<&Model> {
        self.all_models.get(path)
    }

    /// Returns the module at `path`, if known.
    pub fn module(&self, path: &ImportPath) -> Option<&Module> {
        self.modules.get(path)
    }

    fn insert_module(&mut self, module: Module) -> Result<(), ModelError> {
        for model in module.models.values() {
            if let Some(existing) = self.all_models.get(&model.import_path) {
                return Err(ModelError::DuplicateModel {
                    model: model.import_path.to_string(),
                    first: existing.module_import_path.to_string(),
                    second: module.import_path.to_string(),
                });
            }
            self.all_models
                .insert(model.import_path.clone(), model.clone());
        }
        self.modules.insert(module.import_path.clone(), module);
        Ok(())
    }

    fn derived_descendants(&self, parent: &ImportPath) -> Vec<Model> {
        self.all_models
            .values()
            .filter(|m| !m.is_abstract)
            .filter(|m| &m.import_path == parent || m.ancestors.contains(parent))
            .cloned()
            .collect()
    }
}

impl ModelGraph for ModelSnapshot {
    fn modules(&self) -> Vec<&Module> {
        self.modules.values().collect()
    }

    fn installed_apps(&self) -> &[String] {
        &self.installed_apps
    }

    fn concrete_models(&self, parent: &ImportPath) -> Result<Vec<Model>, ModelError> {
        if !self.all_models.contains_key(parent) {
            return Err(ModelError::UnknownModel(parent.to_string()));
        }

        match self.concrete.as_ref().and_then(|c| c.get(parent)) {
            Some(explicit) => {
                let mut found = explicit
                    .iter()
                    .map(|path| {
                        self.all_models
                            .get(path)
                            .cloned()
                            .ok_or_else(|| ModelError::UnknownModel(path.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                found.sort_by(|a, b| a.import_path.cmp(&b.import_path));
                Ok(found)
            }
            None => Ok(self.derived_descendants(parent)),
        }
    }
}
