//! The project load lifecycle.
//!
//! A load cycle moves through
//! `Idle → ScanningSources → DetectingChanges → Compiling → InstallingArtifacts → Active`:
//!
//! 1. Scan `contracts/` into a [`SourceSet`] and reload `build/contracts/`
//!    into an [`ArtifactStore`], discarding invalid artifacts
//! 2. Mark every unit whose artifact is missing, outdated, or built with
//!    different settings as stale
//! 3. Widen the stale set to all transitive dependents and evict their
//!    artifacts
//! 4. Compile every file that declares a unit in that set, in one call
//! 5. Install the returned artifacts and expose a handle per deployable unit

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use kiln_build::{
    ArtifactStore, ChangeDetector, DependencyCloser, LoadReport, Staleness, BUILD_SUBDIR,
};
use kiln_config::{CompilerConfig, ProjectConfig, CONFIG_FILE};
use kiln_source::{SourceSet, SOURCE_DIR};

use crate::compiler::Compiler;
use crate::error::ProjectError;
use crate::handle::ContractHandle;
use crate::registry::ProjectRegistry;

/// Directories created in every project.
const PROJECT_DIRS: &[&str] = &[SOURCE_DIR, "build", BUILD_SUBDIR];

/// Where a project is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
    /// Not loaded.
    Idle,
    /// Reading sources and prior artifacts.
    ScanningSources,
    /// Comparing sources and settings against artifacts.
    DetectingChanges,
    /// Waiting on the compiler.
    Compiling,
    /// Writing new artifacts.
    InstallingArtifacts,
    /// Loaded and registered.
    Active,
    /// The last load failed.
    Failed,
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectState::Idle => "idle",
            ProjectState::ScanningSources => "scanning sources",
            ProjectState::DetectingChanges => "detecting changes",
            ProjectState::Compiling => "compiling",
            ProjectState::InstallingArtifacts => "installing artifacts",
            ProjectState::Active => "active",
            ProjectState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What a load cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Units that were stale on their own.
    pub stale: BTreeSet<String>,
    /// Stale units plus all their transitive dependents.
    pub closure: BTreeSet<String>,
    /// Source files passed to the compiler.
    pub compiled_paths: Vec<String>,
    /// Units whose new artifacts were installed.
    pub installed: Vec<String>,
    /// Artifact files discarded while loading.
    pub discarded: Vec<PathBuf>,
    /// Handles exposed after the load.
    pub handles: usize,
}

impl BuildSummary {
    /// Returns `true` if the compiler was not invoked.
    pub fn is_up_to_date(&self) -> bool {
        self.compiled_paths.is_empty()
    }
}

/// What a load would rebuild, computed without compiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    /// Each stale unit and why it is stale.
    pub stale: BTreeMap<String, Staleness>,
    /// Stale units plus all their transitive dependents.
    pub closure: BTreeSet<String>,
}

/// A contract project on disk and its load-cycle state.
pub struct Project {
    name: String,
    root: PathBuf,
    sources: SourceSet,
    store: ArtifactStore,
    handles: BTreeMap<String, ContractHandle>,
    state: ProjectState,
}

impl Project {
    /// Opens the project at `root`, creating its standard directories.
    ///
    /// When `name` is `None` the name is derived from the directory: the
    /// folder name, suffixed with ` project` unless it already ends that
    /// way, title-cased, keeping letters only (`my-token` → `MyTokenProject`).
    pub fn open(root: &Path, name: Option<&str>) -> Result<Self, ProjectError> {
        let root = canonical_root(root)?;
        for dir in PROJECT_DIRS {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| ProjectError::Io { path, source: e })?;
        }
        let mut store = ArtifactStore::persistent(root.join(BUILD_SUBDIR));
        let report = store.load(&root)?;
        Self::from_parts(root, name, store, report)
    }

    /// Opens the project at `root` without touching the filesystem.
    ///
    /// No directories are created and invalid artifacts are skipped rather
    /// than deleted. Meant for [`plan`](Self::plan); a later `load` still
    /// heals the store.
    pub fn inspect(root: &Path, name: Option<&str>) -> Result<Self, ProjectError> {
        let root = canonical_root(root)?;
        let mut store = ArtifactStore::persistent(root.join(BUILD_SUBDIR));
        let report = store.inspect(&root)?;
        Self::from_parts(root, name, store, report)
    }

    fn from_parts(
        root: PathBuf,
        name: Option<&str>,
        store: ArtifactStore,
        report: LoadReport,
    ) -> Result<Self, ProjectError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => derive_name(&root),
        };
        let sources = SourceSet::scan(&root)?;
        tracing::debug!(
            project = %name,
            units = sources.list_unit_names().len(),
            artifacts = report.loaded.len(),
            discarded = report.discarded.len(),
            "project opened"
        );
        Ok(Self {
            name,
            root,
            sources,
            store,
            handles: BTreeMap::new(),
            state: ProjectState::Idle,
        })
    }

    /// Runs a full load cycle and registers the project as active.
    ///
    /// Fails with [`ProjectError::ProjectAlreadyLoaded`] if this project is
    /// already active or `registry` already holds its name. A compiler error
    /// leaves the project in [`ProjectState::Failed`] with no new artifacts
    /// installed.
    pub fn load(
        &mut self,
        registry: &mut ProjectRegistry,
        compiler: &dyn Compiler,
        config: &CompilerConfig,
    ) -> Result<BuildSummary, ProjectError> {
        if self.state == ProjectState::Active || registry.contains(&self.name) {
            return Err(ProjectError::ProjectAlreadyLoaded(self.name.clone()));
        }

        match self.run_load(compiler, config) {
            Ok(summary) => {
                registry.register(&self.name)?;
                self.state = ProjectState::Active;
                tracing::info!(
                    project = %self.name,
                    handles = self.handles.len(),
                    "project loaded"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = ProjectState::Failed;
                Err(e)
            }
        }
    }

    fn run_load(
        &mut self,
        compiler: &dyn Compiler,
        config: &CompilerConfig,
    ) -> Result<BuildSummary, ProjectError> {
        self.state = ProjectState::ScanningSources;
        self.sources = SourceSet::scan(&self.root)?;
        self.store = ArtifactStore::persistent(self.root.join(BUILD_SUBDIR));
        let report = self.store.load(&self.root)?;

        let mut summary = rebuild(
            &self.sources,
            &mut self.store,
            compiler,
            config,
            &mut self.state,
        )?;
        summary.discarded = report.discarded;

        self.handles = create_handles(&self.store);
        summary.handles = self.handles.len();
        Ok(summary)
    }

    /// Computes which units a load would rebuild, without compiling.
    ///
    /// Sources are rescanned; artifacts are those read by the last
    /// `open`, `inspect`, or `load`. Nothing is written.
    pub fn plan(&self, config: &CompilerConfig) -> Result<BuildPlan, ProjectError> {
        let sources = SourceSet::scan(&self.root)?;
        let store = &self.store;

        let detector = ChangeDetector::new(&sources, store, config);
        let stale: BTreeMap<String, Staleness> = sources
            .list_unit_names()
            .into_iter()
            .map(|unit| (unit.to_string(), detector.check(unit)))
            .filter(|(_, state)| state.is_stale())
            .collect();
        let stale_names: BTreeSet<String> = stale.keys().cloned().collect();
        let closure = DependencyCloser::close(store, &stale_names);
        Ok(BuildPlan { stale, closure })
    }

    /// Deactivates the project, dropping its handles and unregistering it.
    ///
    /// Fails with [`ProjectError::ProjectNotFound`] unless the project is active.
    pub fn close(&mut self, registry: &mut ProjectRegistry) -> Result<(), ProjectError> {
        if self.state != ProjectState::Active {
            return Err(ProjectError::ProjectNotFound(self.name.clone()));
        }
        self.handles.clear();
        registry.unregister(&self.name);
        self.state = ProjectState::Idle;
        tracing::debug!(project = %self.name, "project closed");
        Ok(())
    }

    /// Deletes artifacts of units no longer declared by any source file.
    ///
    /// Returns the removed unit names.
    pub fn remove_orphans(&mut self) -> Result<Vec<String>, ProjectError> {
        let sources = SourceSet::scan(&self.root)?;
        let mut store = ArtifactStore::persistent(self.root.join(BUILD_SUBDIR));
        store.load(&self.root)?;
        let live: BTreeSet<String> = sources
            .list_unit_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let removed = store.gc(&live)?;
        for name in &removed {
            self.handles.remove(name);
        }
        self.sources = sources;
        self.store = store;
        Ok(removed)
    }

    /// The project's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current load-cycle state.
    pub fn state(&self) -> ProjectState {
        self.state
    }

    /// Returns `true` once a load has completed and until `close`.
    pub fn is_active(&self) -> bool {
        self.state == ProjectState::Active
    }

    /// The sources seen by the last load.
    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// The artifacts after the last load.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.store
    }

    /// Returns the handle for `unit`, if it is deployable.
    pub fn get(&self, unit: &str) -> Option<&ContractHandle> {
        self.handles.get(unit)
    }

    /// Returns `true` if a handle exists for `unit`.
    pub fn contains(&self, unit: &str) -> bool {
        self.handles.contains_key(unit)
    }

    /// All handles keyed by unit name.
    pub fn handles(&self) -> &BTreeMap<String, ContractHandle> {
        &self.handles
    }

    /// Handle names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    /// Number of exposed handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no handles are exposed.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("state", &self.state)
            .field("handles", &self.handles.len())
            .finish()
    }
}

/// Detects stale units, closes over dependents, compiles, and installs.
///
/// Shared by on-disk and temporary projects.
pub(crate) fn rebuild(
    sources: &SourceSet,
    store: &mut ArtifactStore,
    compiler: &dyn Compiler,
    config: &CompilerConfig,
    state: &mut ProjectState,
) -> Result<BuildSummary, ProjectError> {
    *state = ProjectState::DetectingChanges;
    let stale = ChangeDetector::new(sources, store, config).stale_units();
    let closure = DependencyCloser::close(store, &stale);
    let evicted = DependencyCloser::evict(store, &closure);
    tracing::debug!(
        stale = stale.len(),
        closure = closure.len(),
        evicted = evicted.len(),
        "computed rebuild set"
    );

    // A file is recompiled if any unit it declares is in the closure.
    let paths: BTreeSet<&str> = closure
        .iter()
        .filter_map(|unit| sources.get_source_path(unit).ok())
        .collect();
    let mut summary = BuildSummary {
        stale,
        closure,
        compiled_paths: paths.iter().map(|p| p.to_string()).collect(),
        ..BuildSummary::default()
    };
    if paths.is_empty() {
        return Ok(summary);
    }

    *state = ProjectState::Compiling;
    let mut inputs = BTreeMap::new();
    for path in &paths {
        inputs.insert(path.to_string(), sources.get(path)?.to_string());
    }
    tracing::info!(
        files = inputs.len(),
        units = summary.closure.len(),
        "compiling"
    );
    let artifacts = compiler.compile(&inputs, config)?;

    *state = ProjectState::InstallingArtifacts;
    for (name, mut artifact) in artifacts {
        if let Ok(fingerprint) = sources.fingerprint(&name, config.minify_source) {
            artifact.fingerprint = fingerprint;
        }
        artifact.contract_name = name;
        summary.installed.push(artifact.contract_name.clone());
        store.add(artifact)?;
    }
    Ok(summary)
}

/// Builds one handle per artifact with non-empty bytecode.
pub(crate) fn create_handles(store: &ArtifactStore) -> BTreeMap<String, ContractHandle> {
    store
        .items()
        .filter_map(|(name, artifact)| {
            ContractHandle::from_artifact(artifact).map(|h| (name.clone(), h))
        })
        .collect()
}

fn canonical_root(root: &Path) -> Result<PathBuf, ProjectError> {
    std::fs::canonicalize(root).map_err(|e| ProjectError::Io {
        path: root.to_path_buf(),
        source: e,
    })
}

/// Walks up from `path` to the nearest directory containing `kiln.toml`.
pub fn check_for_project(path: &Path) -> Option<PathBuf> {
    let path = std::fs::canonicalize(path).ok()?;
    path.ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Loads `kiln.toml` from `root`, or the defaults when there is none.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig, ProjectError> {
    if root.join(CONFIG_FILE).is_file() {
        Ok(kiln_config::load_config(root)?)
    } else {
        tracing::debug!(root = %root.display(), "no {CONFIG_FILE}, using defaults");
        Ok(ProjectConfig::default())
    }
}

/// Derives a registry name from the project directory.
fn derive_name(root: &Path) -> String {
    let mut base = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !base.to_lowercase().ends_with("project") {
        base.push_str(" project");
    }

    let mut name = String::with_capacity(base.len());
    let mut prev_alpha = false;
    for c in base.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                name.extend(c.to_lowercase());
            } else {
                name.extend(c.to_uppercase());
            }
        }
        prev_alpha = c.is_alphabetic();
    }
    name
}
