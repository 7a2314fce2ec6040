//! Shared helpers for CLI commands.
//!
//! Contains project root resolution, command-line overrides of compiler
//! settings, and compiler construction.

use std::path::PathBuf;

use kiln_config::{CompilerConfig, CONFIG_FILE};
use kiln_project::{check_for_project, CommandCompiler};

use crate::{CompilerArgs, GlobalArgs};

/// Compiler program run when `--compiler` is not given.
pub const DEFAULT_COMPILER: &str = "kiln-solc";

/// Resolves the project root directory from global CLI args.
///
/// `--project` is used as given. Otherwise walks up from the current
/// directory looking for `kiln.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref dir) = global.project {
        let dir = PathBuf::from(dir);
        if !dir.is_dir() {
            return Err(format!("project directory {} does not exist", dir.display()).into());
        }
        return Ok(dir);
    }
    let cwd = std::env::current_dir()?;
    let root = check_for_project(&cwd).ok_or_else(|| {
        format!(
            "could not find {CONFIG_FILE} in {} or any parent directory",
            cwd.display()
        )
    })?;
    tracing::debug!(root = %root.display(), "found project root");
    Ok(root)
}

/// Applies command-line overrides on top of the configured compiler settings.
pub fn apply_overrides(mut config: CompilerConfig, args: &CompilerArgs) -> CompilerConfig {
    if args.optimize {
        config.optimize = Some(true);
    }
    if args.no_optimize {
        config.optimize = Some(false);
    }
    if let Some(runs) = args.runs {
        config.runs = Some(runs);
    }
    if let Some(ref evm) = args.evm_version {
        config.evm_version = Some(evm.clone());
    }
    if let Some(ref version) = args.compiler_version {
        config.version = Some(version.clone());
    }
    if args.minify {
        config.minify_source = true;
    }
    config
}

/// Builds a [`CommandCompiler`] from a whitespace-separated command line.
pub fn command_compiler(command: &str) -> Result<CommandCompiler, Box<dyn std::error::Error>> {
    let mut words = command.split_whitespace();
    let program = words.next().ok_or("--compiler must not be empty")?;
    Ok(words.fold(CommandCompiler::new(program), |c, arg| c.arg(arg)))
}
