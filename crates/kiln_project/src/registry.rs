//! Explicit registry of active projects.

use std::collections::BTreeSet;

use crate::error::ProjectError;

/// Tracks which project names are currently active.
///
/// At most one active project may hold a given name. The registry is owned
/// by the caller (a session or workspace) and passed to
/// [`Project::load`](crate::Project::load) and
/// [`Project::close`](crate::Project::close).
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    active: BTreeSet<String>,
}

impl ProjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as active.
    pub fn register(&mut self, name: &str) -> Result<(), ProjectError> {
        if !self.active.insert(name.to_string()) {
            return Err(ProjectError::ProjectAlreadyLoaded(name.to_string()));
        }
        Ok(())
    }

    /// Unregisters `name`, returning whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.active.remove(name)
    }

    /// Returns `true` if a project named `name` is active.
    pub fn contains(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Active project names in order.
    pub fn list(&self) -> Vec<&str> {
        self.active.iter().map(String::as_str).collect()
    }

    /// Number of active projects.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if no project is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Unregisters every project, returning the names that were active.
    pub fn clear(&mut self) -> Vec<String> {
        std::mem::take(&mut self.active).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_list() {
        let mut reg = ProjectRegistry::new();
        reg.register("TokenProject").unwrap();
        reg.register("AuctionProject").unwrap();
        assert_eq!(reg.list(), vec!["AuctionProject", "TokenProject"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = ProjectRegistry::new();
        reg.register("TokenProject").unwrap();
        let err = reg.register("TokenProject").unwrap_err();
        assert!(matches!(err, ProjectError::ProjectAlreadyLoaded(name) if name == "TokenProject"));
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut reg = ProjectRegistry::new();
        reg.register("TokenProject").unwrap();
        assert!(reg.unregister("TokenProject"));
        assert!(!reg.unregister("TokenProject"));
        assert!(reg.is_empty());
    }

    #[test]
    fn clear_returns_names() {
        let mut reg = ProjectRegistry::new();
        reg.register("B").unwrap();
        reg.register("A").unwrap();
        assert_eq!(reg.clear(), vec!["A", "B"]);
        assert!(reg.is_empty());
        reg.register("A").unwrap();
    }
}
