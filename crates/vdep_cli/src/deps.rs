//! `vdep deps`: the dependency closure of one module.

use vdep_common::ImportPath;
use vdep_engine::{Dep, DepsRequest};

use crate::pipeline::{load_combined_report, load_project};
use crate::{DepsArgs, GlobalArgs, OutputFormat};

/// Runs the `vdep deps` command.
///
/// Reads the report snapshot of the last pass and prints every dependency
/// the module needs beyond its own imports.
pub fn run(args: &DepsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let combined = load_combined_report(&project)?;

    let request = DepsRequest {
        file_import_path: ImportPath::new(&args.module)?,
        imports: args
            .imports
            .iter()
            .map(|i| ImportPath::new(i.as_str()))
            .collect::<Result<_, _>>()?,
        super_deps: Vec::new(),
        settings_module: project.engine.settings_module.clone(),
    };
    let deps = combined
        .report
        .additional_deps(&request, &project.engine.closure_settings());

    match args.format {
        OutputFormat::Text => {
            for dep in &deps {
                println!("{}", render_dep(dep));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deps)?),
    }
    Ok(0)
}

fn render_dep(dep: &Dep) -> String {
    format!("{:>4}  {}", dep.priority, dep.module)
}
