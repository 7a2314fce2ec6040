//! Build artifact persistence and incremental change detection.
//!
//! This crate owns the per-unit build record: the [`Artifact`] format written
//! to `build/contracts/<unit>.json`, the self-healing [`ArtifactStore`], the
//! [`ChangeDetector`] that decides which units are stale, and the
//! [`DependencyCloser`] that widens a stale set to everything depending on it.

#![warn(missing_docs)]

pub mod artifact;
pub mod closure;
pub mod detector;
pub mod error;
pub mod store;

pub use artifact::{Artifact, ArtifactKind, CompilerSettings, REQUIRED_KEYS};
pub use closure::DependencyCloser;
pub use detector::{ChangeDetector, Staleness};
pub use error::BuildError;
pub use store::{ArtifactStore, LoadReport, BUILD_SUBDIR};
