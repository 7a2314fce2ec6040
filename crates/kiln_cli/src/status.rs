//! `kiln status`: report what a build would recompile.

use kiln_project::{load_project_config, Project};

use crate::pipeline::{apply_overrides, resolve_project_root};
use crate::{GlobalArgs, StatusArgs};

/// Runs the `kiln status` command.
///
/// Prints each stale unit with its reason, then any dependents pulled in
/// with it. Writes nothing to the project. Always returns exit code 0.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = load_project_config(&project_dir)?;
    let settings = apply_overrides(config.compiler, &args.settings);

    let project = Project::inspect(&project_dir, config.project.name.as_deref())?;
    let plan = project.plan(&settings)?;

    if global.quiet {
        return Ok(0);
    }
    if plan.closure.is_empty() {
        eprintln!("   {} is up to date", project.name());
        return Ok(0);
    }
    for (unit, reason) in &plan.stale {
        eprintln!("   {unit}: {reason}");
    }
    for unit in plan.closure.iter().filter(|u| !plan.stale.contains_key(*u)) {
        eprintln!("   {unit}: depends on a changed unit");
    }
    eprintln!("   {} unit(s) would be recompiled", plan.closure.len());
    Ok(0)
}
