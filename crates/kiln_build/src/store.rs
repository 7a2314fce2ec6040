//! The durable per-unit artifact store.
//!
//! Each artifact lives at `<project>/build/contracts/<unit>.json`. Loading is
//! self-healing: any file that fails validation, or whose source no longer
//! exists, is deleted and skipped instead of failing the whole load.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::artifact::Artifact;
use crate::error::BuildError;

/// Artifact directory relative to the project root.
pub const BUILD_SUBDIR: &str = "build/contracts";

/// File extension for artifact files.
const ARTIFACT_EXT: &str = "json";

/// Outcome of [`ArtifactStore::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Units whose artifacts were loaded.
    pub loaded: Vec<String>,
    /// Artifact files that were invalid or stale. Deleted by `load`, left
    /// in place by `inspect`.
    pub discarded: Vec<PathBuf>,
}

/// The mapping of unit name to its last-known build artifact.
///
/// When constructed with a persistence directory, every [`add`](Self::add)
/// is mirrored to one JSON file per unit. Iteration is ordered by unit name.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    /// Directory artifact files are read from and written to.
    dir: Option<PathBuf>,

    /// Current entries keyed by unit name.
    entries: BTreeMap<String, Artifact>,
}

impl ArtifactStore {
    /// Creates an empty store that persists artifacts under `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            entries: BTreeMap::new(),
        }
    }

    /// Creates an empty store with no backing directory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Returns the persistence directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Returns the file path an artifact for `unit` is persisted to.
    pub fn artifact_path(&self, unit: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{unit}.{ARTIFACT_EXT}")))
    }

    /// Loads every persisted artifact, validating each against `project_root`.
    ///
    /// A file is discarded (deleted from disk) when it is not valid JSON,
    /// lacks a required key, is named for a different unit than its
    /// `contractName`, or names a `sourcePath` that no longer exists under
    /// `project_root`. Only a failure to list the directory itself is an
    /// error; a missing directory loads nothing.
    pub fn load(&mut self, project_root: &Path) -> Result<LoadReport, BuildError> {
        self.read_entries(project_root, true)
    }

    /// Like [`load`](Self::load), but leaves invalid files on disk.
    ///
    /// They are skipped and listed in [`LoadReport::discarded`].
    pub fn inspect(&mut self, project_root: &Path) -> Result<LoadReport, BuildError> {
        self.read_entries(project_root, false)
    }

    fn read_entries(&mut self, project_root: &Path, heal: bool) -> Result<LoadReport, BuildError> {
        let mut report = LoadReport::default();
        let Some(dir) = self.dir.clone() else {
            return Ok(report);
        };
        if !dir.is_dir() {
            return Ok(report);
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| BuildError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT))
            .collect();
        paths.sort();

        for path in paths {
            match read_valid(&path, project_root) {
                Ok(artifact) => {
                    report.loaded.push(artifact.contract_name.clone());
                    self.entries
                        .insert(artifact.contract_name.clone(), artifact);
                }
                Err(reason) if !heal => {
                    tracing::debug!(path = %path.display(), %reason, "skipping invalid build artifact");
                    report.discarded.push(path);
                }
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "discarding build artifact");
                    if let Err(e) = std::fs::remove_file(&path) {
                        tracing::warn!(path = %path.display(), error = %e, "could not delete artifact");
                    }
                    report.discarded.push(path);
                }
            }
        }

        tracing::debug!(
            loaded = report.loaded.len(),
            discarded = report.discarded.len(),
            "loaded build artifacts"
        );
        Ok(report)
    }

    /// Inserts or replaces the artifact for `artifact.contract_name`.
    ///
    /// With a persistence directory, the file is written atomically before
    /// the in-memory entry changes, so a failed write leaves both the old
    /// entry and every other artifact untouched.
    pub fn add(&mut self, artifact: Artifact) -> Result<(), BuildError> {
        if let Some(path) = self.artifact_path(&artifact.contract_name) {
            write_atomic(&path, artifact.to_canonical_json()?.as_bytes())?;
        }
        self.entries.insert(artifact.contract_name.clone(), artifact);
        Ok(())
    }

    /// Removes the in-memory entry for `unit`. Absent units are a no-op.
    pub fn remove(&mut self, unit: &str) -> Option<Artifact> {
        self.entries.remove(unit)
    }

    /// Returns the artifact for `unit`.
    pub fn get(&self, unit: &str) -> Result<&Artifact, BuildError> {
        self.entries
            .get(unit)
            .ok_or_else(|| BuildError::NotFound(unit.to_string()))
    }

    /// Returns `true` if an artifact is stored for `unit`.
    pub fn contains(&self, unit: &str) -> bool {
        self.entries.contains_key(unit)
    }

    /// Returns every unit whose artifact lists `unit` as a dependency.
    pub fn get_dependents(&self, unit: &str) -> BTreeSet<String> {
        self.entries
            .values()
            .filter(|a| a.depends_on(unit))
            .map(|a| a.contract_name.clone())
            .collect()
    }

    /// Iterates over all entries in unit-name order.
    pub fn items(&self) -> impl Iterator<Item = (&String, &Artifact)> {
        self.entries.iter()
    }

    /// Iterates over stored unit names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no artifacts are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every artifact whose unit is not in `live`, in memory and on
    /// disk, then deletes any persisted artifact file without an entry.
    ///
    /// Returns the removed unit names in order.
    pub fn gc(&mut self, live: &BTreeSet<String>) -> Result<Vec<String>, BuildError> {
        let dead: Vec<String> = self
            .entries
            .keys()
            .filter(|name| !live.contains(*name))
            .cloned()
            .collect();
        let mut removed: BTreeSet<String> = BTreeSet::new();
        for name in dead {
            self.entries.remove(&name);
            removed.insert(name);
        }

        let Some(dir) = self.dir.clone() else {
            return Ok(removed.into_iter().collect());
        };
        if !dir.is_dir() {
            return Ok(removed.into_iter().collect());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| BuildError::Io {
            path: dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|e| BuildError::Io {
                    path: dir.clone(),
                    source: e,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !self.entries.contains_key(stem) {
                let stem = stem.to_string();
                std::fs::remove_file(&path).map_err(|e| BuildError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed.insert(stem);
            }
        }

        Ok(removed.into_iter().collect())
    }
}

/// Reads and validates one artifact file.
fn read_valid(path: &Path, project_root: &Path) -> Result<Artifact, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let artifact = Artifact::from_json(&text)?;
    let stem = path.file_stem().and_then(|s| s.to_str());
    if stem != Some(artifact.contract_name.as_str()) {
        return Err(format!(
            "file is named for a different unit than '{}'",
            artifact.contract_name
        ));
    }
    if !project_root.join(&artifact.source_path).exists() {
        return Err(format!("source '{}' no longer exists", artifact.source_path));
    }
    Ok(artifact)
}

/// Writes `data` to a temporary file beside `path`, then renames it into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), BuildError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(data).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
