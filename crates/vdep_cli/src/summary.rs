//! `vdep summary`: the summary recorded in one installed artifact.

use std::path::Path;

use vdep_engine::{get_report_summary, AnyOf, KnownModules, ReportStore, SearchPathResolver};

use crate::pipeline::{load_project, Project};
use crate::{GlobalArgs, SummaryArgs};

/// Runs the `vdep summary` command.
///
/// Prints `None` when the artifact has no usable summary.
pub fn run(args: &SummaryArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let summary = get_report_summary(
        Path::new(&args.artifact),
        &project.engine.extension,
        &live_modules(&project),
    );
    println!("{}", summary.as_deref().unwrap_or("None"));
    Ok(0)
}

/// A module counts as live if the last pass generated it or it exists under a
/// configured search path.
fn live_modules(project: &Project) -> AnyOf<KnownModules, SearchPathResolver> {
    let generated = ReportStore::new(&project.resolved.destination)
        .load()
        .map(|combined| combined.report.report_import_path.into_keys().collect())
        .unwrap_or_else(Vec::new);
    AnyOf(
        KnownModules::new(generated),
        SearchPathResolver::new(
            project.engine.search_paths.clone(),
            project.engine.extension.clone(),
        ),
    )
}
