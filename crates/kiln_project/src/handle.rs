//! Callable handles for compiled units.

use kiln_build::{Artifact, ArtifactKind};

/// A deployable compiled unit exposed by an active project.
///
/// Deployment and calls go through the network layer, which consumes the
/// handle's ABI and bytecode.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractHandle {
    artifact: Artifact,
}

impl ContractHandle {
    /// Wraps an artifact, returning `None` when it has no bytecode.
    pub fn from_artifact(artifact: &Artifact) -> Option<Self> {
        artifact.is_deployable().then(|| Self {
            artifact: artifact.clone(),
        })
    }

    /// The unit name.
    pub fn name(&self) -> &str {
        &self.artifact.contract_name
    }

    /// The unit's ABI.
    pub fn abi(&self) -> &serde_json::Value {
        &self.artifact.abi
    }

    /// Creation bytecode as hex.
    pub fn bytecode(&self) -> &str {
        &self.artifact.bytecode
    }

    /// The unit kind.
    pub fn kind(&self) -> ArtifactKind {
        self.artifact.kind
    }

    /// The full artifact the handle was built from.
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }
}
