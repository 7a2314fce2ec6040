//! Project load lifecycle for incremental contract builds.
//!
//! A [`Project`] scans its sources, reloads prior artifacts, detects stale
//! units, widens them to their dependents, recompiles the affected files with
//! a [`Compiler`], and exposes a [`ContractHandle`] for every deployable unit.
//! Active projects are tracked in an explicit [`ProjectRegistry`].

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod handle;
pub mod project;
pub mod registry;
pub mod temp;

pub use compiler::{CommandCompiler, CompilationError, Compiler};
pub use error::ProjectError;
pub use handle::ContractHandle;
pub use project::{
    check_for_project, load_project_config, BuildPlan, BuildSummary, Project, ProjectState,
};
pub use registry::ProjectRegistry;
pub use temp::{compile_source, TempProject};
