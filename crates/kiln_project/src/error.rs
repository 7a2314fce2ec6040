//! Error types for the project lifecycle.

use std::path::PathBuf;

use crate::compiler::CompilationError;

/// Errors raised while opening, loading, or closing a project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The project is already active, or another active project uses its name.
    #[error("project '{0}' is already loaded")]
    ProjectAlreadyLoaded(String),

    /// The project is not active, or no project exists at the given path.
    #[error("project '{0}' is not loaded")]
    ProjectNotFound(String),

    /// Source scanning or lookup failed.
    #[error(transparent)]
    Source(#[from] kiln_source::SourceError),

    /// An artifact could not be read or written.
    #[error(transparent)]
    Build(#[from] kiln_build::BuildError),

    /// The project configuration is invalid.
    #[error(transparent)]
    Config(#[from] kiln_config::ConfigError),

    /// The compiler rejected the sources.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// A project directory could not be created or resolved.
    #[error("project I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_loaded_display() {
        let err = ProjectError::ProjectAlreadyLoaded("TokenProject".to_string());
        assert_eq!(err.to_string(), "project 'TokenProject' is already loaded");
    }

    #[test]
    fn not_found_display() {
        let err = ProjectError::ProjectNotFound("TokenProject".to_string());
        assert_eq!(err.to_string(), "project 'TokenProject' is not loaded");
    }

    #[test]
    fn compilation_is_transparent() {
        let err: ProjectError = CompilationError::new("ParserError: expected ';'").into();
        assert_eq!(err.to_string(), "compilation failed: ParserError: expected ';'");
    }
}
