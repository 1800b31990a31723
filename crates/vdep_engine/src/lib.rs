//! The virtual-dependency engine.
//!
//! One analysis pass turns a [`ModelGraph`](vdep_model::ModelGraph) into a set
//! of generated alias modules on disk plus a [`CombinedReport`] describing how
//! those modules relate to each other:
//!
//! 1. [`VirtualDependencyNamer`] maps each real module to a virtual one.
//! 2. [`VirtualDependency::create`] hashes the facts that matter for a module
//!    and looks up the concrete descendants of each of its models.
//! 3. [`VirtualDependencyScribe`] renders artifact text and the per-module
//!    [`Report`].
//! 4. [`ReportInstaller`] stages, installs, and garbage-collects artifacts.
//! 5. [`combine`] merges the per-module reports, and [`Report::additional_deps`]
//!    answers dependency-closure queries against the merged graph.
//!
//! [`VirtualDependencyHandler`] ties the stages together.

#![warn(missing_docs)]

pub mod closure;
pub mod combine;
pub mod dependency;
pub mod error;
pub mod handler;
pub mod installer;
pub mod namer;
pub mod report;
pub mod scribe;
pub mod settings;
pub mod store;
pub mod summary;

pub use closure::{ClosureSettings, Dep, DepsRequest};
pub use combine::{combine, CombinedReport};
pub use dependency::{
    DifferentiatorPolicy, SummaryState, VirtualDependency, VirtualDependencySummary,
};
pub use error::EngineError;
pub use handler::{GenerationOutcome, ModuleFailure, VirtualDependencyHandler};
pub use installer::{InstallOutcome, ReportInstaller};
pub use namer::VirtualDependencyNamer;
pub use report::Report;
pub use scribe::{VirtualDependencyScribe, WrittenVirtualDependency};
pub use settings::EngineSettings;
pub use store::ReportStore;
pub use summary::{get_report_summary, AnyOf, KnownModules, ModuleResolver, SearchPathResolver};
