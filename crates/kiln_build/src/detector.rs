//! Per-unit staleness checks.
//!
//! Compares the current source fingerprint and active compiler configuration
//! against each unit's stored artifact to decide what must be recompiled.

use std::collections::BTreeSet;
use std::fmt;

use kiln_config::CompilerConfig;
use kiln_source::SourceSet;

use crate::artifact::CompilerSettings;
use crate::store::ArtifactStore;

/// Why a unit does or does not need recompiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// The stored artifact matches the current source and settings.
    Fresh,
    /// No artifact exists, or the unit is no longer in the source set.
    Missing,
    /// The source fingerprint differs from the recorded one.
    SourceChanged,
    /// A configured compiler setting differs from the recorded one.
    SettingsChanged {
        /// The differing setting.
        field: &'static str,
    },
}

impl Staleness {
    /// Returns `true` for every state except [`Staleness::Fresh`].
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Fresh)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Fresh => f.write_str("up to date"),
            Staleness::Missing => f.write_str("not built"),
            Staleness::SourceChanged => f.write_str("source changed"),
            Staleness::SettingsChanged { field } => write!(f, "compiler {field} changed"),
        }
    }
}

/// Read-only view over sources, artifacts, and configuration that answers
/// "must this unit be rebuilt?".
pub struct ChangeDetector<'a> {
    sources: &'a SourceSet,
    store: &'a ArtifactStore,
    config: &'a CompilerConfig,
}

impl<'a> ChangeDetector<'a> {
    /// Creates a detector over the given state.
    pub fn new(sources: &'a SourceSet, store: &'a ArtifactStore, config: &'a CompilerConfig) -> Self {
        Self {
            sources,
            store,
            config,
        }
    }

    /// Classifies a single unit.
    pub fn check(&self, unit: &str) -> Staleness {
        let Ok(artifact) = self.store.get(unit) else {
            return Staleness::Missing;
        };
        let Ok(fingerprint) = self.sources.fingerprint(unit, self.config.minify_source) else {
            return Staleness::Missing;
        };
        if fingerprint != artifact.fingerprint {
            return Staleness::SourceChanged;
        }
        match settings_mismatch(self.config, &artifact.compiler) {
            Some(field) => Staleness::SettingsChanged { field },
            None => Staleness::Fresh,
        }
    }

    /// Returns `true` if `unit` must be recompiled.
    pub fn is_stale(&self, unit: &str) -> bool {
        self.check(unit).is_stale()
    }

    /// Returns every stale unit in the source set, in name order.
    pub fn stale_units(&self) -> BTreeSet<String> {
        self.sources
            .list_unit_names()
            .into_iter()
            .filter(|unit| {
                let state = self.check(unit);
                if state.is_stale() {
                    tracing::debug!(%unit, reason = %state, "unit is stale");
                }
                state.is_stale()
            })
            .map(str::to_string)
            .collect()
    }
}

/// Returns the first configured setting that differs from `recorded`.
///
/// Unset (`None` or empty) configuration fields are never compared.
fn settings_mismatch(config: &CompilerConfig, recorded: &CompilerSettings) -> Option<&'static str> {
    if let Some(version) = config.version() {
        if normalize_version(version) != normalize_version(&recorded.version) {
            return Some("version");
        }
    }
    if let Some(optimize) = config.optimize {
        if optimize != recorded.optimize {
            return Some("optimize");
        }
    }
    if let Some(runs) = config.runs {
        if runs != recorded.runs {
            return Some("runs");
        }
    }
    if let Some(evm_version) = config.evm_version() {
        if recorded.evm_version.as_deref() != Some(evm_version) {
            return Some("evmVersion");
        }
    }
    None
}

/// Strips a leading `v` and any `+commit...` build suffix.
fn normalize_version(version: &str) -> &str {
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('+').next().unwrap_or(version)
}
