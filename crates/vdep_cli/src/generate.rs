//! `vdep generate`: one full pass over a model snapshot.
//!
//! 1. Find the project and load `vdep.toml`
//! 2. Load the JSON model snapshot
//! 3. Build, render, and install every module's artifact
//! 4. Persist the combined report and print the outcome

use std::path::Path;

use serde::Serialize;
use tracing::debug;
use vdep_engine::{GenerationOutcome, InstallOutcome, VirtualDependencyHandler};
use vdep_model::ModelSnapshot;

use crate::pipeline::load_project;
use crate::{GenerateArgs, GlobalArgs, OutputFormat};

/// Machine-readable form of a pass outcome.
#[derive(Serialize)]
struct GenerateReport<'a> {
    version: &'a str,
    modules: usize,
    install: &'a InstallOutcome,
    failures: Vec<FailureEntry>,
}

#[derive(Serialize)]
struct FailureEntry {
    module: String,
    error: String,
}

/// Runs the `vdep generate` command.
///
/// Returns exit code 0 if every module produced an artifact, 1 otherwise.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    debug!(root = %project.root.display(), "loaded project");

    if !global.quiet && args.format == OutputFormat::Text {
        eprintln!("  Generating {}", project.resolved.name);
    }

    let snapshot = ModelSnapshot::load(Path::new(&args.models))?;
    let handler = VirtualDependencyHandler::new(project.engine);
    let outcome = handler.make_report(&snapshot, &project.resolved.destination)?;

    match args.format {
        OutputFormat::Text => {
            for failure in &outcome.failures {
                eprintln!("error: {}: {}", failure.module, failure.error);
            }
            if !global.quiet {
                eprintln!("{}", render_text(&outcome));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_report(&outcome))?);
        }
    }

    if outcome.failures.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn to_report(outcome: &GenerationOutcome) -> GenerateReport<'_> {
    GenerateReport {
        version: &outcome.combined.version,
        modules: outcome.combined.report.report_import_path.len(),
        install: &outcome.install,
        failures: outcome
            .failures
            .iter()
            .map(|f| FailureEntry {
                module: f.module.to_string(),
                error: f.error.to_string(),
            })
            .collect(),
    }
}

fn render_text(outcome: &GenerationOutcome) -> String {
    format!(
        "    Finished {} module(s): {} installed, {} unchanged, {} removed, {} failed (version {})",
        outcome.combined.report.report_import_path.len(),
        outcome.install.installed.len(),
        outcome.install.unchanged.len(),
        outcome.install.removed.len(),
        outcome.failures.len(),
        outcome.combined.version,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vdep_common::ImportPath;
    use vdep_engine::{CombinedReport, EngineError, ModuleFailure, Report};

    fn outcome() -> GenerationOutcome {
        let mut report = Report::new();
        report.register_module(
            &ImportPath::new("shop.models").unwrap(),
            &ImportPath::new("__virtual_deps__.mod_1").unwrap(),
        );
        GenerationOutcome {
            combined: CombinedReport {
                version: "feed".to_string(),
                report,
            },
            install: InstallOutcome {
                installed: vec![PathBuf::from("out/__virtual_deps__/mod_1.py")],
                unchanged: vec![],
                removed: vec![PathBuf::from("out/__virtual_deps__/mod_0.py")],
            },
            failures: vec![ModuleFailure {
                module: ImportPath::new("broken.models").unwrap(),
                error: EngineError::Serialization {
                    reason: "boom".to_string(),
                },
            }],
        }
    }

    #[test]
    fn text_summary_counts_everything() {
        let text = render_text(&outcome());
        assert!(text.contains("1 module(s)"));
        assert!(text.contains("1 installed"));
        assert!(text.contains("0 unchanged"));
        assert!(text.contains("1 removed"));
        assert!(text.contains("1 failed"));
        assert!(text.contains("version feed"));
    }

    #[test]
    fn json_report_lists_failures() {
        let outcome = outcome();
        let json = serde_json::to_value(to_report(&outcome)).unwrap();
        assert_eq!(json["version"], "feed");
        assert_eq!(json["modules"], 1);
        assert_eq!(json["install"]["installed"][0], "out/__virtual_deps__/mod_1.py");
        assert_eq!(json["failures"][0]["module"], "broken.models");
        assert_eq!(json["failures"][0]["error"], "serialization error: boom");
    }
}
