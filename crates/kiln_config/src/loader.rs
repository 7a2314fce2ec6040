//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file. Its presence marks a project root.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects explicitly empty values that would otherwise be silently ignored.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "project.name must not be empty".to_string(),
        ));
    }
    if config.compiler.version.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "compiler.version must not be empty".to_string(),
        ));
    }
    if config.compiler.evm_version.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "compiler.evm_version must not be empty".to_string(),
        ));
    }
    Ok(())
}
