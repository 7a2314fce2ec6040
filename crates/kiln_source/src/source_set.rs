//! The in-memory set of project sources and the units they declare.

use std::collections::BTreeMap;
use std::path::Path;

use kiln_common::{ContentHash, ContentHasher};

use crate::declaration::{find_declarations, UnitKind};
use crate::error::SourceError;
use crate::minify::minify;

/// Directory under the project root that holds contract sources.
pub const SOURCE_DIR: &str = "contracts";

/// File extension of contract sources.
pub const SOURCE_EXT: &str = "sol";

/// Where a unit is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    /// Project-relative path of the declaring file.
    pub path: String,
    /// The declaration kind.
    pub kind: UnitKind,
}

/// All source files of one load cycle, keyed by project-relative path, and
/// an index from unit name to declaring file.
///
/// Immutable once built. Iteration over paths and unit names is
/// lexicographic.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: BTreeMap<String, String>,
    units: BTreeMap<String, UnitInfo>,
}

impl SourceSet {
    /// Scans `<project_root>/contracts` recursively for `.sol` files.
    ///
    /// Any path with a component beginning with `_` is treated as internal
    /// and skipped. A missing source directory yields an empty set.
    pub fn scan(project_root: &Path) -> Result<Self, SourceError> {
        let src_dir = project_root.join(SOURCE_DIR);
        let mut files = BTreeMap::new();
        if src_dir.is_dir() {
            walk_dir(project_root, &src_dir, &mut files)?;
        }
        tracing::debug!(
            root = %project_root.display(),
            files = files.len(),
            "scanned contract sources"
        );
        Ok(Self::from_sources(files))
    }

    /// Builds a set from in-memory `path → text` pairs.
    pub fn from_sources(files: BTreeMap<String, String>) -> Self {
        let mut units: BTreeMap<String, UnitInfo> = BTreeMap::new();
        for (path, text) in &files {
            for decl in find_declarations(text) {
                if let Some(existing) = units.get(&decl.name) {
                    tracing::warn!(
                        unit = %decl.name,
                        kept = %existing.path,
                        ignored = %path,
                        "unit declared in more than one file"
                    );
                    continue;
                }
                units.insert(
                    decl.name,
                    UnitInfo {
                        path: path.clone(),
                        kind: decl.kind,
                    },
                );
            }
        }
        Self { files, units }
    }

    /// Returns the full text of the file holding `name`, which may be either
    /// a unit name or a source path.
    pub fn get(&self, name: &str) -> Result<&str, SourceError> {
        if let Some(text) = self.files.get(name) {
            return Ok(text);
        }
        let info = self.unit(name)?;
        Ok(&self.files[&info.path])
    }

    /// Returns the project-relative path of the file declaring `unit`.
    pub fn get_source_path(&self, unit: &str) -> Result<&str, SourceError> {
        self.unit(unit).map(|info| info.path.as_str())
    }

    /// Returns declaration info for `unit`.
    pub fn unit(&self, unit: &str) -> Result<&UnitInfo, SourceError> {
        self.units
            .get(unit)
            .ok_or_else(|| SourceError::NotFound(unit.to_string()))
    }

    /// Returns `true` if `unit` is declared by some source file.
    pub fn contains_unit(&self, unit: &str) -> bool {
        self.units.contains_key(unit)
    }

    /// Computes the fingerprint of `unit`.
    ///
    /// The hash covers the unit name and the whole file with every other
    /// unit's declaration cut out, so file-level code (pragmas, imports,
    /// constants, free functions) counts but sibling edits do not. With
    /// `minify` set, the file is normalized first.
    pub fn fingerprint(&self, unit: &str, minify_source: bool) -> Result<ContentHash, SourceError> {
        let text = self.get(unit)?;
        Ok(fingerprint_text(text, unit, minify_source))
    }

    /// Returns all unit names in lexicographic order.
    pub fn list_unit_names(&self) -> Vec<&str> {
        self.units.keys().map(String::as_str).collect()
    }

    /// Returns all source paths in lexicographic order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of source files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if there are no source files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Fingerprints `unit` within `text`.
///
/// Everything in the file except the other units' declarations is hashed:
/// pragmas, imports, file-level constants, free functions, and the unit's
/// own body. Falls back to hashing the whole text when the unit is not
/// declared there.
fn fingerprint_text(text: &str, unit: &str, minify_source: bool) -> ContentHash {
    let normalized;
    let text = if minify_source {
        normalized = minify(text);
        normalized.as_str()
    } else {
        text
    };

    let decls = find_declarations(text);
    let mut hasher = ContentHasher::new();
    hasher.part(unit.as_bytes());
    if !decls.iter().any(|d| d.name == unit) {
        hasher.part(text.as_bytes());
        return hasher.finish();
    }

    let mut pos = 0;
    for sibling in decls.iter().filter(|d| d.name != unit) {
        if sibling.span.start >= pos {
            hasher.part(text[pos..sibling.span.start].as_bytes());
        }
        pos = pos.max(sibling.span.end);
    }
    hasher.part(text[pos..].as_bytes());
    hasher.finish()
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    files: &mut BTreeMap<String, String>,
) -> Result<(), SourceError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| SourceError::Io { path, source }
    };
    let entries = std::fs::read_dir(dir).map_err(io_err(dir))?;
    for entry in entries {
        let path = entry.map_err(io_err(dir))?.path();
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        if is_internal(rel) {
            continue;
        }
        if path.is_dir() {
            walk_dir(root, &path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXT) {
            let text = std::fs::read_to_string(&path).map_err(io_err(&path))?;
            files.insert(to_key(rel), text);
        }
    }
    Ok(())
}

/// Internal-only paths have a component starting with `_`.
fn is_internal(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('_'))
}

fn to_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, &str)]) -> SourceSet {
        SourceSet::from_sources(
            entries
                .iter()
                .map(|(p, t)| (p.to_string(), t.to_string()))
                .collect(),
        )
    }

    #[test]
    fn units_map_to_their_file() {
        let s = set(&[
            ("contracts/A.sol", "contract A {}"),
            ("contracts/Lib.sol", "library L {}\ninterface I {}"),
        ]);
        assert_eq!(s.list_unit_names(), vec!["A", "I", "L"]);
        assert_eq!(s.get_source_path("L").unwrap(), "contracts/Lib.sol");
        assert_eq!(s.get_source_path("I").unwrap(), "contracts/Lib.sol");
    }

    #[test]
    fn get_accepts_unit_or_path() {
        let s = set(&[("contracts/A.sol", "contract A {}")]);
        assert_eq!(s.get("A").unwrap(), "contract A {}");
        assert_eq!(s.get("contracts/A.sol").unwrap(), "contract A {}");
    }

    #[test]
    fn get_unknown_is_not_found() {
        let s = set(&[]);
        assert!(matches!(s.get("Nope"), Err(SourceError::NotFound(_))));
        assert!(matches!(
            s.get_source_path("Nope"),
            Err(SourceError::NotFound(_))
        ));
        assert!(s.fingerprint("Nope", false).is_err());
    }

    #[test]
    fn duplicate_unit_keeps_first_path() {
        let s = set(&[
            ("contracts/b.sol", "contract Dup {}"),
            ("contracts/a.sol", "contract Dup { }"),
        ]);
        assert_eq!(s.get_source_path("Dup").unwrap(), "contracts/a.sol");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let s = set(&[("contracts/A.sol", "contract A { uint x; }")]);
        assert_eq!(
            s.fingerprint("A", false).unwrap(),
            s.fingerprint("A", false).unwrap()
        );
    }

    #[test]
    fn fingerprint_scoped_by_unit_name() {
        let s = set(&[("contracts/AB.sol", "contract A {}\ncontract B {}")]);
        assert_ne!(
            s.fingerprint("A", false).unwrap(),
            s.fingerprint("B", false).unwrap()
        );
    }

    #[test]
    fn minify_ignores_cosmetic_edits() {
        let before = set(&[("contracts/A.sol", "contract A {\n  uint x = 1;\n}")]);
        let after = set(&[(
            "contracts/A.sol",
            "// comment\ncontract A { uint x = 1; /* more */ }",
        )]);
        assert_eq!(
            before.fingerprint("A", true).unwrap(),
            after.fingerprint("A", true).unwrap()
        );
        assert_ne!(
            before.fingerprint("A", false).unwrap(),
            after.fingerprint("A", false).unwrap()
        );
    }

    #[test]
    fn minify_still_sees_token_edits() {
        let before = set(&[("contracts/A.sol", "contract A { uint x = 1; }")]);
        let after = set(&[("contracts/A.sol", "contract A { uint x = 2; }")]);
        assert_ne!(
            before.fingerprint("A", true).unwrap(),
            after.fingerprint("A", true).unwrap()
        );
    }

    #[test]
    fn sibling_edit_does_not_change_fingerprint() {
        let before = set(&[("contracts/AB.sol", "contract A {}\ncontract B {}")]);
        let after = set(&[("contracts/AB.sol", "contract A {}\ncontract B { uint y; }")]);
        assert_eq!(
            before.fingerprint("A", false).unwrap(),
            after.fingerprint("A", false).unwrap()
        );
        assert_ne!(
            before.fingerprint("B", false).unwrap(),
            after.fingerprint("B", false).unwrap()
        );
    }

    #[test]
    fn free_function_edit_changes_fingerprint() {
        let file = |ret: &str| {
            format!(
                "pragma solidity ^0.8.0;\n\
                 contract A {{ function f() public pure returns (uint) {{ return helper(); }} }}\n\
                 function helper() pure returns (uint) {{ return {ret}; }}\n"
            )
        };
        let before = set(&[("contracts/A.sol", file("1").as_str())]);
        let after = set(&[("contracts/A.sol", file("2").as_str())]);
        assert_ne!(
            before.fingerprint("A", false).unwrap(),
            after.fingerprint("A", false).unwrap()
        );
        assert_ne!(
            before.fingerprint("A", true).unwrap(),
            after.fingerprint("A", true).unwrap()
        );
    }

    #[test]
    fn constant_between_units_changes_both() {
        let before = set(&[(
            "contracts/AB.sol",
            "contract A {}\nuint constant X = 1;\ncontract B { uint y = X; }\n",
        )]);
        let after = set(&[(
            "contracts/AB.sol",
            "contract A {}\nuint constant X = 7;\ncontract B { uint y = X; }\n",
        )]);
        for unit in ["A", "B"] {
            assert_ne!(
                before.fingerprint(unit, false).unwrap(),
                after.fingerprint(unit, false).unwrap()
            );
        }
    }

    #[test]
    fn preamble_edit_changes_fingerprint() {
        let before = set(&[("contracts/A.sol", "pragma solidity ^0.8.0;\ncontract A {}")]);
        let after = set(&[("contracts/A.sol", "pragma solidity ^0.8.20;\ncontract A {}")]);
        assert_ne!(
            before.fingerprint("A", false).unwrap(),
            after.fingerprint("A", false).unwrap()
        );
    }

    #[test]
    fn scan_skips_internal_paths() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = dir.path().join("contracts");
        std::fs::create_dir_all(contracts.join("nested")).unwrap();
        std::fs::create_dir_all(contracts.join("_private")).unwrap();
        std::fs::write(contracts.join("A.sol"), "contract A {}").unwrap();
        std::fs::write(contracts.join("nested/B.sol"), "contract B is A {}").unwrap();
        std::fs::write(contracts.join("_Mock.sol"), "contract Mock {}").unwrap();
        std::fs::write(contracts.join("_private/C.sol"), "contract C {}").unwrap();
        std::fs::write(contracts.join("README.md"), "contract Doc {}").unwrap();

        let s = SourceSet::scan(dir.path()).unwrap();
        assert_eq!(
            s.paths().collect::<Vec<_>>(),
            vec!["contracts/A.sol", "contracts/nested/B.sol"]
        );
        assert_eq!(s.list_unit_names(), vec!["A", "B"]);
    }

    #[test]
    fn scan_without_source_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let s = SourceSet::scan(dir.path()).unwrap();
        assert!(s.is_empty());
        assert!(s.list_unit_names().is_empty());
    }
}
