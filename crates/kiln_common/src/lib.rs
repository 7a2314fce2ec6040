//! Shared foundational types used across the Kiln build engine.
//!
//! This crate provides the content fingerprint type used by source
//! scanning, artifact persistence, and change detection.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, ContentHasher, ParseHashError};
