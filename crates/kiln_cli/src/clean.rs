//! `kiln clean`: delete build artifacts.

use std::collections::BTreeSet;

use kiln_build::{ArtifactStore, BUILD_SUBDIR};
use kiln_project::{load_project_config, Project};

use crate::pipeline::resolve_project_root;
use crate::{CleanArgs, GlobalArgs};

/// Runs the `kiln clean` command.
///
/// Without `--orphans` every artifact file is deleted; with it, only those
/// of units no longer declared by any source file.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;

    let removed = if args.orphans {
        let config = load_project_config(&project_dir)?;
        let mut project = Project::open(&project_dir, config.project.name.as_deref())?;
        project.remove_orphans()?
    } else {
        // An empty store swept against no live units deletes every file.
        let mut store = ArtifactStore::persistent(project_dir.join(BUILD_SUBDIR));
        store.gc(&BTreeSet::new())?
    };

    if !global.quiet {
        for unit in &removed {
            eprintln!("   Removed {unit}");
        }
        eprintln!("   Cleaned {} artifact(s)", removed.len());
    }
    Ok(0)
}
