//! One-off compilation of source text outside any project directory.

use std::collections::BTreeMap;

use kiln_build::ArtifactStore;
use kiln_config::CompilerConfig;
use kiln_source::SourceSet;

use crate::compiler::Compiler;
use crate::error::ProjectError;
use crate::handle::ContractHandle;
use crate::project::{create_handles, rebuild, BuildSummary, ProjectState};

/// Path under which ad-hoc source text is presented to the compiler.
pub const STDIN_PATH: &str = "<stdin>";

/// Handles compiled from a single in-memory source.
///
/// Nothing is written to disk and nothing is registered.
#[derive(Debug)]
pub struct TempProject {
    store: ArtifactStore,
    handles: BTreeMap<String, ContractHandle>,
    summary: BuildSummary,
}

impl TempProject {
    /// Returns the handle for `unit`, if it is deployable.
    pub fn get(&self, unit: &str) -> Option<&ContractHandle> {
        self.handles.get(unit)
    }

    /// Returns `true` if a handle exists for `unit`.
    pub fn contains(&self, unit: &str) -> bool {
        self.handles.contains_key(unit)
    }

    /// All handles keyed by unit name.
    pub fn handles(&self) -> &BTreeMap<String, ContractHandle> {
        &self.handles
    }

    /// Handle names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    /// Number of exposed handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no handles are exposed.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Every artifact the compiler returned, including non-deployable ones.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.store
    }

    /// What the compile did.
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }
}

/// Compiles `source` as a standalone file and exposes its units.
pub fn compile_source(
    source: &str,
    config: &CompilerConfig,
    compiler: &dyn Compiler,
) -> Result<TempProject, ProjectError> {
    let sources = SourceSet::from_sources(BTreeMap::from([(
        STDIN_PATH.to_string(),
        source.to_string(),
    )]));
    let mut store = ArtifactStore::in_memory();
    let mut state = ProjectState::Idle;
    let mut summary = rebuild(&sources, &mut store, compiler, config, &mut state)?;

    let handles = create_handles(&store);
    summary.handles = handles.len();
    Ok(TempProject {
        store,
        handles,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilationError;
    use kiln_build::{Artifact, ArtifactKind, CompilerSettings};
    use kiln_common::ContentHash;
    use std::collections::BTreeSet;

    fn artifact(name: &str, bytecode: &str) -> Artifact {
        Artifact {
            contract_name: name.to_string(),
            fingerprint: ContentHash::from_bytes(b""),
            compiler: CompilerSettings {
                version: "0.8.24".to_string(),
                optimize: true,
                runs: 200,
                evm_version: None,
            },
            dependencies: BTreeSet::new(),
            bytecode: bytecode.to_string(),
            deployed_bytecode: String::new(),
            abi: serde_json::json!([]),
            source_path: STDIN_PATH.to_string(),
            kind: ArtifactKind::Contract,
            metadata: serde_json::Value::Null,
        }
    }

    fn compiler(
        sources: &BTreeMap<String, String>,
        _: &CompilerConfig,
    ) -> Result<BTreeMap<String, Artifact>, CompilationError> {
        assert_eq!(sources.keys().collect::<Vec<_>>(), vec![STDIN_PATH]);
        Ok(BTreeMap::from([
            ("Token".to_string(), artifact("Token", "6080")),
            ("IToken".to_string(), artifact("IToken", "")),
        ]))
    }

    #[test]
    fn compiles_every_unit_once() {
        let src = "interface IToken {}\ncontract Token is IToken {}\n";
        let temp = compile_source(src, &CompilerConfig::default(), &compiler).unwrap();

        assert_eq!(temp.names().collect::<Vec<_>>(), vec!["Token"]);
        assert_eq!(temp.artifacts().len(), 2);
        assert_eq!(temp.summary().compiled_paths, vec![STDIN_PATH]);
        assert_eq!(
            temp.get("Token").unwrap().artifact().fingerprint,
            SourceSet::from_sources(BTreeMap::from([(STDIN_PATH.to_string(), src.to_string())]))
                .fingerprint("Token", false)
                .unwrap()
        );
    }

    #[test]
    fn empty_source_skips_compiler() {
        let never = |_: &BTreeMap<String, String>, _: &CompilerConfig| {
            Err::<BTreeMap<String, Artifact>, _>(CompilationError::new("should not run"))
        };
        let temp = compile_source("// nothing here\n", &CompilerConfig::default(), &never).unwrap();
        assert!(temp.is_empty());
        assert!(temp.summary().is_up_to_date());
    }

    #[test]
    fn compiler_failure_propagates() {
        let failing = |_: &BTreeMap<String, String>, _: &CompilerConfig| {
            Err::<BTreeMap<String, Artifact>, _>(CompilationError::new("ParserError"))
        };
        let err = compile_source("contract A {}", &CompilerConfig::default(), &failing).unwrap_err();
        assert!(matches!(err, ProjectError::Compilation(_)));
    }
}
