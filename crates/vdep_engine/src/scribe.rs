//! Artifact rendering.
//!
//! The scribe turns a [`VirtualDependency`] into the text of its artifact and,
//! as it emits each alias, records the alias and the modules it touches in a
//! fresh [`Report`].

use std::collections::BTreeSet;

use vdep_common::ImportPath;

use crate::dependency::VirtualDependency;
use crate::error::EngineError;
use crate::report::Report;

/// Prefix of the alias naming the union of a model's concrete descendants.
pub const CONCRETE_PREFIX: &str = "Concrete__";

/// Prefix of the alias naming the union of a model's concrete querysets.
pub const QUERYSET_PREFIX: &str = "ConcreteQuerySet__";

/// The rendered artifact for one module.
#[derive(Debug, Clone)]
pub struct WrittenVirtualDependency {
    /// Artifact text.
    pub content: String,
    /// The summary written into the artifact, if the module is installed.
    pub summary_hash: Option<String>,
    /// What this artifact contributes to the combined report.
    pub report: Report,
    /// The virtual module path the artifact is installed at.
    pub virtual_import_path: ImportPath,
}

/// Renders artifacts.
#[derive(Debug, Clone)]
pub struct VirtualDependencyScribe {
    generic_queryset: ImportPath,
}

impl VirtualDependencyScribe {
    /// Creates a scribe that falls back to `generic_queryset[<model>]` for
    /// descendants without a custom queryset.
    pub fn new(generic_queryset: ImportPath) -> Self {
        Self { generic_queryset }
    }

    /// Renders `virtual_dependency`.
    ///
    /// Output is deterministic: imports and alias lines are sorted, and each
    /// alias union is sorted. Models without concrete descendants get no alias.
    pub fn write(
        &self,
        virtual_dependency: &VirtualDependency,
    ) -> Result<WrittenVirtualDependency, EngineError> {
        let summary = &virtual_dependency.summary;
        let virtual_import_path = summary.virtual_name.clone();
        let summary_hash = summary.summary_hash();

        let mut report = Report::new();
        report.register_module(&summary.module_import_path, &virtual_import_path);

        let mut imports: BTreeSet<&str> = BTreeSet::new();
        let mut aliases: BTreeSet<String> = BTreeSet::new();

        for (model, concrete) in &virtual_dependency.concrete_models {
            if concrete.is_empty() {
                continue;
            }

            let mut descendants: BTreeSet<&str> = BTreeSet::new();
            let mut querysets: BTreeSet<String> = BTreeSet::new();

            imports.insert(model.as_str());
            for conc in concrete {
                imports.insert(conc.import_path.as_str());
                descendants.insert(conc.import_path.as_str());
                match &conc.default_custom_queryset {
                    Some(queryset) => {
                        imports.insert(queryset.as_str());
                        querysets.insert(queryset.to_string());
                    }
                    None => {
                        imports.insert(self.generic_queryset.as_str());
                        querysets.insert(format!("{}[{}]", self.generic_queryset, conc.import_path));
                    }
                }
            }

            let concrete_name = format!("{CONCRETE_PREFIX}{}", model.name());
            let queryset_name = format!("{QUERYSET_PREFIX}{}", model.name());
            aliases.insert(format!("{concrete_name} = {}", join_union(descendants)));
            aliases.insert(format!("{queryset_name} = {}", join_union(querysets)));

            report.register_model(
                model,
                virtual_import_path.join(&concrete_name)?,
                virtual_import_path.join(&queryset_name)?,
                concrete,
            );
        }

        let marker = virtual_dependency
            .interface_differentiator
            .as_deref()
            .unwrap_or("empty__");
        let summary_line = match &summary_hash {
            Some(hash) => format!("\"{hash}\""),
            None => "None".to_string(),
        };

        let mut content = format!(
            "from typing import TYPE_CHECKING\n\
             \n\
             def interface__{marker}() -> None:\n    return None\n\
             \n\
             mod = \"{}\"\n\
             summary = {summary_line}\n",
            summary.module_import_path
        );

        if !aliases.is_empty() {
            content.push_str("\nif TYPE_CHECKING:\n");
            for import in &imports {
                content.push_str(&format!("    import {import}\n"));
            }
            for alias in &aliases {
                content.push_str(&format!("    {alias}\n"));
            }
        }

        Ok(WrittenVirtualDependency {
            content,
            summary_hash,
            report,
            virtual_import_path,
        })
    }
}

fn join_union<S: AsRef<str>>(items: BTreeSet<S>) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" | ")
}
