//! `vdep aliases`: concrete and queryset alias lookups.

use std::collections::BTreeMap;

use serde::Serialize;
use vdep_common::ImportPath;
use vdep_engine::Report;

use crate::pipeline::{load_combined_report, load_project};
use crate::{AliasesArgs, GlobalArgs, OutputFormat};

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Aliases {
    concrete: Option<ImportPath>,
    queryset: Option<ImportPath>,
}

/// Runs the `vdep aliases` command.
///
/// Returns exit code 1 if any requested model has no concrete alias.
pub fn run(args: &AliasesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let combined = load_combined_report(&project)?;

    let models = args
        .models
        .iter()
        .map(|m| ImportPath::new(m.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let table = lookup(&combined.report, &models);

    match args.format {
        OutputFormat::Text => {
            for (model, aliases) in &table {
                println!("{model}");
                println!("    concrete: {}", display_alias(&aliases.concrete));
                println!("    queryset: {}", display_alias(&aliases.queryset));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }

    if table.values().all(|a| a.concrete.is_some()) {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn lookup(report: &Report, models: &[ImportPath]) -> BTreeMap<ImportPath, Aliases> {
    let mut concrete = report.get_concrete_aliases(models);
    let mut queryset = report.get_queryset_aliases(models);
    models
        .iter()
        .map(|m| {
            let aliases = Aliases {
                concrete: concrete.remove(m).flatten(),
                queryset: queryset.remove(m).flatten(),
            };
            (m.clone(), aliases)
        })
        .collect()
}

fn display_alias(alias: &Option<ImportPath>) -> String {
    alias
        .as_ref()
        .map_or_else(|| "-".to_string(), ImportPath::to_string)
}
