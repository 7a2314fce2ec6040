//! Source discovery, unit declaration scanning, and content fingerprints.
//!
//! This crate provides the [`SourceSet`], the in-memory view of every contract
//! source file in a project, keyed both by project-relative path and by the
//! names of the units each file declares.

#![warn(missing_docs)]

pub mod declaration;
pub mod error;
pub mod minify;
pub mod source_set;

pub use declaration::{find_declarations, Declaration, UnitKind};
pub use error::SourceError;
pub use minify::minify;
pub use source_set::{SourceSet, UnitInfo, SOURCE_DIR, SOURCE_EXT};
