//! Modules, models, and fields.
//!
//! These are plain values rebuilt on every analysis pass. A [`Module`] owns
//! the [`Model`]s defined in it, and each model owns its [`Field`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vdep_common::{ImportPath, InvalidImportPath};

/// A single field on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Import path of the type used to represent this field.
    pub field_type: ImportPath,

    /// The model on the other side of the relation, if this field is one.
    #[serde(default)]
    pub related_model: Option<ImportPath>,
}

impl Field {
    /// Creates a plain (non-relation) field.
    pub fn new(field_type: ImportPath) -> Self {
        Self {
            field_type,
            related_model: None,
        }
    }

    /// Creates a relation field pointing at `related_model`.
    pub fn related(field_type: ImportPath, related_model: ImportPath) -> Self {
        Self {
            field_type,
            related_model: Some(related_model),
        }
    }
}

/// An entity class defined in a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// The bare class name (last segment of `import_path`).
    pub model_name: String,

    /// Import path of the module that defines this model.
    pub module_import_path: ImportPath,

    /// Full import path of this model.
    pub import_path: ImportPath,

    /// Whether the model is abstract (never instantiated directly).
    pub is_abstract: bool,

    /// The custom queryset type used by the default manager, if any.
    pub default_custom_queryset: Option<ImportPath>,

    /// Fields keyed by name.
    pub fields: BTreeMap<String, Field>,

    /// Model ancestors in resolution order, excluding the model itself and
    /// the root base type.
    pub ancestors: Vec<ImportPath>,
}

impl Model {
    /// Creates a concrete model named `name` inside `module`.
    pub fn new(module: &ImportPath, name: &str) -> Result<Self, InvalidImportPath> {
        Ok(Self {
            model_name: name.to_string(),
            module_import_path: module.clone(),
            import_path: module.join(name)?,
            is_abstract: false,
            default_custom_queryset: None,
            fields: BTreeMap::new(),
            ancestors: Vec::new(),
        })
    }

    /// Marks the model abstract.
    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Sets the default custom queryset.
    pub fn with_queryset(mut self, queryset: ImportPath) -> Self {
        self.default_custom_queryset = Some(queryset);
        self
    }

    /// Appends an ancestor.
    pub fn with_ancestor(mut self, ancestor: ImportPath) -> Self {
        self.ancestors.push(ancestor);
        self
    }

    /// Adds or replaces a field.
    pub fn with_field(mut self, name: &str, field: Field) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    /// Iterates over the related models of every relation field.
    pub fn related_models(&self) -> impl Iterator<Item = &ImportPath> {
        self.fields.values().filter_map(|f| f.related_model.as_ref())
    }
}

/// A source module that may define models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// The module's import path.
    pub import_path: ImportPath,

    /// Whether the module belongs to an installed application. Facts about
    /// uninstalled modules cannot be trusted and are never hashed.
    pub installed: bool,

    /// Models defined in this module, keyed by name.
    pub models: BTreeMap<String, Model>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(import_path: ImportPath, installed: bool) -> Self {
        Self {
            import_path,
            installed,
            models: BTreeMap::new(),
        }
    }

    /// Adds a model, keyed by its name.
    pub fn with_model(mut self, model: Model) -> Self {
        self.models.insert(model.model_name.clone(), model);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    #[test]
    fn model_new_derives_import_path() {
        let m = Model::new(&ip("app.models"), "Parent").unwrap();
        assert_eq!(m.import_path, ip("app.models.Parent"));
        assert_eq!(m.module_import_path, ip("app.models"));
        assert!(!m.is_abstract);
    }

    #[test]
    fn model_new_rejects_bad_name() {
        assert!(Model::new(&ip("app.models"), "not-valid").is_err());
    }

    #[test]
    fn related_models_skips_plain_fields() {
        let m = Model::new(&ip("app.models"), "Child")
            .unwrap()
            .with_field("name", Field::new(ip("fields.CharField")))
            .with_field(
                "other",
                Field::related(ip("fields.ForeignKey"), ip("other.models.Other")),
            );
        let related: Vec<_> = m.related_models().collect();
        assert_eq!(related, vec![&ip("other.models.Other")]);
    }

    #[test]
    fn module_keys_models_by_name() {
        let module = ip("app.models");
        let m = Module::new(module.clone(), true)
            .with_model(Model::new(&module, "A").unwrap())
            .with_model(Model::new(&module, "B").unwrap().into_abstract());
        assert_eq!(m.models.len(), 2);
        assert!(m.models["B"].is_abstract);
    }
}
