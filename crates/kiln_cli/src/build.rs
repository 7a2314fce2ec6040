//! `kiln build`: incremental compilation.
//!
//! 1. Find project root (walk up looking for `kiln.toml`)
//! 2. Load config and apply command-line overrides
//! 3. Open the project and run one load cycle with the external compiler
//! 4. Report what was recompiled

use kiln_project::{load_project_config, BuildSummary, Project, ProjectRegistry};

use crate::pipeline::{apply_overrides, command_compiler, resolve_project_root};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `kiln build` command.
///
/// Returns exit code 0 on success. Compiler failures are returned as errors.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = load_project_config(&project_dir)?;
    let settings = apply_overrides(config.compiler, &args.settings);
    let compiler = command_compiler(&args.compiler)?;

    let mut project = Project::open(&project_dir, config.project.name.as_deref())?;
    if !global.quiet {
        eprintln!("   Building {} ({})", project.name(), project.root().display());
    }

    let mut registry = ProjectRegistry::new();
    let summary = project.load(&mut registry, &compiler, &settings)?;

    if !global.quiet {
        for line in report(&summary, global.verbose) {
            eprintln!("{line}");
        }
    }

    project.close(&mut registry)?;
    Ok(0)
}

/// Status lines for a finished load, one per installed unit.
fn report(summary: &BuildSummary, verbose: bool) -> Vec<String> {
    let mut lines: Vec<String> = summary
        .discarded
        .iter()
        .map(|path| format!("   Discarded {}", path.display()))
        .collect();
    if summary.is_up_to_date() {
        lines.push("   Up to date".to_string());
    } else {
        lines.extend(summary.installed.iter().map(|unit| format!("   Compiled {unit}")));
        if verbose {
            lines.extend(summary.compiled_paths.iter().map(|path| format!("     from {path}")));
        }
    }
    lines.push(format!(
        "   Finished {} unit(s) recompiled, {} deployable",
        summary.installed.len(),
        summary.handles
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_installed_units() {
        let summary = BuildSummary {
            stale: ["A".to_string(), "Removed".to_string()].into(),
            closure: ["A".to_string(), "Removed".to_string()].into(),
            compiled_paths: vec!["contracts/AB.sol".to_string()],
            installed: vec!["A".to_string(), "B".to_string()],
            handles: 2,
            ..BuildSummary::default()
        };
        assert_eq!(
            report(&summary, false),
            vec![
                "   Compiled A",
                "   Compiled B",
                "   Finished 2 unit(s) recompiled, 2 deployable",
            ]
        );
        assert!(report(&summary, true).contains(&"     from contracts/AB.sol".to_string()));
    }

    #[test]
    fn report_up_to_date() {
        let summary = BuildSummary {
            handles: 3,
            ..BuildSummary::default()
        };
        assert_eq!(
            report(&summary, false),
            vec!["   Up to date", "   Finished 0 unit(s) recompiled, 3 deployable"]
        );
    }
}
