//! Kiln CLI: the command-line interface for incremental contract builds.
//!
//! Provides `kiln build` to compile whatever changed since the last build,
//! `kiln status` to report what a build would recompile, and `kiln clean`
//! to delete build artifacts.

#![warn(missing_docs)]

mod build;
mod clean;
mod logging;
mod pipeline;
mod status;

use std::process;

use clap::{Args, Parser, Subcommand};

/// Kiln: incremental builds for smart-contract projects.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln contract build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Project directory. Defaults to the nearest parent containing `kiln.toml`.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every changed unit and its dependents.
    Build(BuildArgs),
    /// Show which units a build would recompile.
    Status(StatusArgs),
    /// Delete build artifacts.
    Clean(CleanArgs),
}

/// Compiler settings that override `[compiler]` in `kiln.toml`.
#[derive(Args, Debug, Default, Clone)]
pub struct CompilerArgs {
    /// Enable the optimizer.
    #[arg(long, conflicts_with = "no_optimize")]
    pub optimize: bool,

    /// Disable the optimizer.
    #[arg(long)]
    pub no_optimize: bool,

    /// Optimizer runs.
    #[arg(long)]
    pub runs: Option<u32>,

    /// Target EVM version (e.g., "paris").
    #[arg(long)]
    pub evm_version: Option<String>,

    /// Compiler version recorded in and compared against artifacts.
    #[arg(long)]
    pub compiler_version: Option<String>,

    /// Fingerprint sources with comments and formatting stripped.
    #[arg(long)]
    pub minify: bool,
}

/// Arguments for the `kiln build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Compiler program and its arguments (e.g., `--compiler "solc-wrapper --fast"`).
    #[arg(long, default_value = pipeline::DEFAULT_COMPILER)]
    pub compiler: String,

    /// Compiler setting overrides.
    #[command(flatten)]
    pub settings: CompilerArgs,
}

/// Arguments for the `kiln status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Compiler setting overrides.
    #[command(flatten)]
    pub settings: CompilerArgs,
}

/// Arguments for the `kiln clean` subcommand.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Only delete artifacts of units no longer declared in any source.
    #[arg(long)]
    pub orphans: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose information.
    pub verbose: bool,
    /// Explicit project directory.
    pub project: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        project: cli.project,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
