//! vdep CLI: generates virtual-dependency artifacts and answers the queries an
//! incremental type checker asks about them.
//!
//! `vdep generate` runs a full pass from a model snapshot, `vdep deps` prints
//! the dependency closure of a module, `vdep aliases` looks up concrete and
//! queryset aliases, and `vdep summary` reads the summary of one artifact.

#![warn(missing_docs)]

mod aliases;
mod deps;
mod generate;
mod pipeline;
mod summary;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// vdep: virtual dependencies for incremental type checking.
#[derive(Parser, Debug)]
#[command(name = "vdep", version, about = "Virtual dependency generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `vdep.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate and install artifacts for every module of a snapshot.
    Generate(GenerateArgs),
    /// Print the dependencies a module must be re-checked against.
    Deps(DepsArgs),
    /// Print the concrete and queryset aliases of models.
    Aliases(AliasesArgs),
    /// Print the summary recorded in an artifact.
    Summary(SummaryArgs),
}

/// Arguments for the `vdep generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// JSON model snapshot to generate from.
    #[arg(short, long)]
    pub models: String,

    /// Output format for the pass outcome.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `vdep deps` subcommand.
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Import path of the module being checked.
    pub module: String,

    /// Fully qualified names the module imports.
    #[arg(short, long = "import")]
    pub imports: Vec<String>,

    /// Output format for the dependency list.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `vdep aliases` subcommand.
#[derive(Parser, Debug)]
pub struct AliasesArgs {
    /// Model import paths to look up.
    #[arg(required = true)]
    pub models: Vec<String>,

    /// Output format for the alias table.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `vdep summary` subcommand.
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Path to a generated artifact.
    pub artifact: String,
}

/// Output format for command results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Deps(ref args) => deps::run(args, &global),
        Command::Aliases(ref args) => aliases::run(args, &global),
        Command::Summary(ref args) => summary::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `VDEP_LOG` applies unless a flag
/// picks the level.
fn init_tracing(global: &GlobalArgs) {
    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else if global.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("VDEP_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
