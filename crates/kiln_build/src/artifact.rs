//! The persisted build artifact for a single compiled unit.
//!
//! Artifacts are stored as pretty-printed JSON with lexicographically ordered
//! keys so that rebuilding an unchanged unit produces a byte-identical file.

use std::collections::BTreeSet;

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Keys every artifact file must contain to be considered valid.
pub const REQUIRED_KEYS: &[&str] = &[
    "abi",
    "bytecode",
    "compiler",
    "contractName",
    "dependencies",
    "fingerprint",
    "sourcePath",
];

/// Compiler settings recorded when an artifact was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    /// Exact compiler version used.
    pub version: String,
    /// Whether the optimizer was enabled.
    pub optimize: bool,
    /// Optimizer runs.
    pub runs: u32,
    /// Target EVM version, if one was requested.
    #[serde(default)]
    pub evm_version: Option<String>,
}

/// What kind of unit an artifact was compiled from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A concrete or abstract contract.
    #[default]
    Contract,
    /// An interface.
    Interface,
    /// A library.
    Library,
}

/// Build output and metadata for one compiled unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// The unit name; also the artifact's store key and file stem.
    pub contract_name: String,
    /// Source fingerprint at compile time.
    pub fingerprint: ContentHash,
    /// Settings the unit was compiled with.
    pub compiler: CompilerSettings,
    /// Names of units this unit's compiled output depends on.
    pub dependencies: BTreeSet<String>,
    /// Creation bytecode as hex. Empty for interfaces and abstract contracts.
    pub bytecode: String,
    /// Runtime bytecode as hex.
    #[serde(default)]
    pub deployed_bytecode: String,
    /// Contract ABI.
    pub abi: serde_json::Value,
    /// Project-relative path of the declaring source file.
    pub source_path: String,
    /// Unit kind.
    #[serde(rename = "type", default)]
    pub kind: ArtifactKind,
    /// Additional compiler output (source maps, opcodes, ...).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Artifact {
    /// Returns `true` if the artifact carries deployable bytecode.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    /// Returns `true` if this unit's output depends on `unit`.
    pub fn depends_on(&self, unit: &str) -> bool {
        self.dependencies.contains(unit)
    }

    /// Serializes to the canonical on-disk form: pretty JSON, sorted keys,
    /// trailing newline.
    pub fn to_canonical_json(&self) -> Result<String, BuildError> {
        let to_err = |e: serde_json::Error| BuildError::Serialization {
            reason: e.to_string(),
        };
        // `Value` objects are key-sorted maps, so this normalizes field order.
        let value = serde_json::to_value(self).map_err(to_err)?;
        let mut json = serde_json::to_string_pretty(&value).map_err(to_err)?;
        json.push('\n');
        Ok(json)
    }

    /// Parses and validates an artifact file's contents.
    ///
    /// Returns a description of the problem if the text is not JSON, is
    /// missing a required key, or has a malformed field.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let object = value
            .as_object()
            .ok_or_else(|| "artifact is not a JSON object".to_string())?;
        if let Some(key) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
            return Err(format!("missing required key '{key}'"));
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(name: &str, deps: &[&str]) -> Artifact {
        Artifact {
            contract_name: name.to_string(),
            fingerprint: ContentHash::from_bytes(name.as_bytes()),
            compiler: CompilerSettings {
                version: "0.8.24".to_string(),
                optimize: true,
                runs: 200,
                evm_version: None,
            },
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            bytecode: "6080".to_string(),
            deployed_bytecode: "6080".to_string(),
            abi: serde_json::json!([]),
            source_path: format!("contracts/{name}.sol"),
            kind: ArtifactKind::Contract,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn canonical_json_roundtrip() {
        let a = sample("Token", &["SafeMath", "ERC20"]);
        let json = a.to_canonical_json().unwrap();
        let back = Artifact::from_json(&json).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn canonical_json_has_sorted_keys() {
        let json = sample("Token", &[]).to_canonical_json().unwrap();
        let positions: Vec<usize> = ["\"abi\"", "\"bytecode\"", "\"compiler\"", "\"sourcePath\"", "\"type\""]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn canonical_json_is_stable() {
        let a = sample("Token", &["B", "A"]);
        assert_eq!(a.to_canonical_json().unwrap(), a.to_canonical_json().unwrap());
        assert!(a.to_canonical_json().unwrap().contains("\"A\",\n    \"B\""));
    }

    #[test]
    fn missing_required_key_rejected() {
        let mut value = serde_json::to_value(sample("Token", &[])).unwrap();
        value.as_object_mut().unwrap().remove("sourcePath");
        let err = Artifact::from_json(&value.to_string()).unwrap_err();
        assert!(err.contains("sourcePath"));
    }

    #[test]
    fn invalid_json_rejected() {
        assert!(Artifact::from_json("{ not json").is_err());
        assert!(Artifact::from_json("[1, 2]").is_err());
    }

    #[test]
    fn malformed_fingerprint_rejected() {
        let mut value = serde_json::to_value(sample("Token", &[])).unwrap();
        value["fingerprint"] = serde_json::json!("xyz");
        assert!(Artifact::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn optional_fields_default() {
        let mut value = serde_json::to_value(sample("Token", &[])).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("deployedBytecode");
        obj.remove("type");
        let back = Artifact::from_json(&value.to_string()).unwrap();
        assert_eq!(back.kind, ArtifactKind::Contract);
        assert!(back.deployed_bytecode.is_empty());
    }

    #[test]
    fn deployable_requires_bytecode() {
        let mut a = sample("IToken", &[]);
        assert!(a.is_deployable());
        a.bytecode.clear();
        assert!(!a.is_deployable());
    }
}
