//! Transitive dependent closure over stored artifact metadata.

use std::collections::BTreeSet;

use crate::store::ArtifactStore;

/// Expands stale units to everything that transitively depends on them.
///
/// There is no persisted dependency graph: reverse edges come from
/// [`ArtifactStore::get_dependents`], which scans every artifact's recorded
/// dependencies.
pub struct DependencyCloser;

impl DependencyCloser {
    /// Computes the least fixed point of `stale ∪ dependents(stale)`.
    ///
    /// Terminates on cyclic metadata because a unit enters the worklist at
    /// most once.
    pub fn close(store: &ArtifactStore, stale: &BTreeSet<String>) -> BTreeSet<String> {
        let mut closure = stale.clone();
        let mut worklist: Vec<String> = stale.iter().cloned().collect();

        while let Some(unit) = worklist.pop() {
            for dependent in store.get_dependents(&unit) {
                if closure.insert(dependent.clone()) {
                    tracing::debug!(%unit, %dependent, "dependent pulled into rebuild");
                    worklist.push(dependent);
                }
            }
        }
        closure
    }

    /// Removes every closure member that has an artifact, so that the next
    /// compile produces a fresh entry instead of a stale read.
    ///
    /// Returns the evicted unit names in order.
    pub fn evict(store: &mut ArtifactStore, closure: &BTreeSet<String>) -> Vec<String> {
        closure
            .iter()
            .filter(|unit| store.remove(unit).is_some())
            .cloned()
            .collect()
    }
}
