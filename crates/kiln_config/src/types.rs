//! Configuration types deserialized from `kiln.toml`.

use serde::{Deserialize, Serialize};

/// Optimizer runs used when the configuration does not say otherwise.
pub const DEFAULT_RUNS: u32 = 200;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectMeta,
    /// Compiler settings for every unit in the project.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// Optional project metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectMeta {
    /// Name the project is registered under once loaded. When absent the
    /// name is derived from the project directory.
    #[serde(default)]
    pub name: Option<String>,
}

/// The active compilation configuration.
///
/// Every field except `minify_source` is optional. A field left as `None`
/// is not compared against previously recorded artifact settings, so it
/// never forces a recompile on its own. `Some(0)` runs and
/// `Some(false)` optimize are real values and are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler version requirement (e.g. `"0.8.24"`).
    pub version: Option<String>,
    /// Whether the optimizer is enabled.
    pub optimize: Option<bool>,
    /// Optimizer runs.
    pub runs: Option<u32>,
    /// Target EVM version (e.g. `"paris"`).
    pub evm_version: Option<String>,
    /// Normalize source text before fingerprinting so that comment and
    /// whitespace edits do not trigger recompilation.
    pub minify_source: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            version: None,
            optimize: Some(true),
            runs: Some(DEFAULT_RUNS),
            evm_version: None,
            minify_source: false,
        }
    }
}

impl CompilerConfig {
    /// Returns a configuration with every comparable field unset.
    pub fn unset() -> Self {
        Self {
            version: None,
            optimize: None,
            runs: None,
            evm_version: None,
            minify_source: false,
        }
    }

    /// The configured version, treating an empty string as unset.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    /// The configured EVM version, treating an empty string as unset.
    pub fn evm_version(&self) -> Option<&str> {
        self.evm_version.as_deref().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_optimizer() {
        let cfg = CompilerConfig::default();
        assert_eq!(cfg.optimize, Some(true));
        assert_eq!(cfg.runs, Some(DEFAULT_RUNS));
        assert!(!cfg.minify_source);
    }

    #[test]
    fn empty_strings_read_as_unset() {
        let cfg = CompilerConfig {
            version: Some(String::new()),
            evm_version: Some(String::new()),
            ..CompilerConfig::unset()
        };
        assert!(cfg.version().is_none());
        assert!(cfg.evm_version().is_none());
    }

    #[test]
    fn unset_has_no_comparable_fields() {
        let cfg = CompilerConfig::unset();
        assert!(cfg.version().is_none());
        assert!(cfg.optimize.is_none());
        assert!(cfg.runs.is_none());
        assert!(cfg.evm_version().is_none());
    }
}
