//! Error types for source loading and lookup.

use std::path::PathBuf;

/// Errors raised by [`SourceSet`](crate::SourceSet) operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested unit name or source path is not part of the set.
    #[error("unknown source or unit '{0}'")]
    NotFound(String),

    /// A source file or directory could not be read.
    #[error("failed to read source {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
