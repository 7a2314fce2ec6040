//! Error types for artifact store operations.

use std::path::PathBuf;

/// Errors that can occur while querying or persisting build artifacts.
///
/// Loading is fail-safe: a corrupt or stale artifact file is deleted and
/// skipped rather than reported. These variants surface only for lookups
/// of absent units and for failures writing a new artifact.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No artifact is stored for the requested unit.
    #[error("no build artifact for '{0}'")]
    NotFound(String),

    /// An I/O error occurred while reading or writing artifact files.
    #[error("artifact I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
