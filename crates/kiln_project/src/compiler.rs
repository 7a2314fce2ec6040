//! The compiler collaborator interface.
//!
//! Kiln does not compile anything itself. A [`Compiler`] receives the full
//! text of every source file that needs rebuilding and returns one
//! [`Artifact`] per compiled unit.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use kiln_build::Artifact;
use kiln_common::ContentHash;
use kiln_config::CompilerConfig;
use serde::Serialize;

/// The compiler rejected its input or could not be run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compilation failed: {message}")]
pub struct CompilationError {
    /// Diagnostic text from the compiler.
    pub message: String,
}

impl CompilationError {
    /// Creates a compilation error with the given diagnostic text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Compiles source files into per-unit artifacts.
///
/// `sources` maps project-relative paths to full file text. Implementations
/// must be deterministic for identical inputs. The returned artifacts'
/// `fingerprint` fields are overwritten by the caller with the source set's
/// fingerprint, so a compiler may leave them as any value.
pub trait Compiler {
    /// Compiles `sources` under `config`.
    fn compile(
        &self,
        sources: &BTreeMap<String, String>,
        config: &CompilerConfig,
    ) -> Result<BTreeMap<String, Artifact>, CompilationError>;
}

impl<F> Compiler for F
where
    F: Fn(
        &BTreeMap<String, String>,
        &CompilerConfig,
    ) -> Result<BTreeMap<String, Artifact>, CompilationError>,
{
    fn compile(
        &self,
        sources: &BTreeMap<String, String>,
        config: &CompilerConfig,
    ) -> Result<BTreeMap<String, Artifact>, CompilationError> {
        self(sources, config)
    }
}

/// Request written to an external compiler's stdin.
#[derive(Serialize)]
struct CompileRequest<'a> {
    sources: &'a BTreeMap<String, String>,
    settings: &'a CompilerConfig,
}

/// Runs an external program as the compiler.
///
/// The program receives `{"sources": {...}, "settings": {...}}` as JSON on
/// stdin and must print a JSON object mapping unit names to artifact objects
/// on stdout. `contractName` and `fingerprint` may be omitted from each
/// artifact. A non-zero exit status is a [`CompilationError`] carrying the
/// program's stderr.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompiler {
    /// Creates a compiler that runs `program` with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument passed to the program on every run.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(&self, input: &[u8]) -> Result<Vec<u8>, CompilationError> {
        let program = self.program.display().to_string();
        let spawn_err =
            |e: std::io::Error| CompilationError::new(format!("could not run {program}: {e}"));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        let stdin = child.stdin.take();

        // Feed stdin on its own thread so a child that fills its output
        // pipes, or exits without reading everything, cannot stall us.
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => match stdin.write_all(input) {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    result => result,
                },
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(spawn_err)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompilationError::new(stderr.trim().to_string()));
        }
        written.map_err(spawn_err)?;
        Ok(output.stdout)
    }
}

impl Compiler for CommandCompiler {
    fn compile(
        &self,
        sources: &BTreeMap<String, String>,
        config: &CompilerConfig,
    ) -> Result<BTreeMap<String, Artifact>, CompilationError> {
        let request = serde_json::to_vec(&CompileRequest {
            sources,
            settings: config,
        })
        .map_err(|e| CompilationError::new(e.to_string()))?;
        let stdout = self.run(&request)?;
        parse_output(&stdout)
    }
}

/// Parses compiler output, filling in `contractName` and `fingerprint` when absent.
fn parse_output(stdout: &[u8]) -> Result<BTreeMap<String, Artifact>, CompilationError> {
    let invalid = |reason: String| CompilationError::new(format!("invalid compiler output: {reason}"));
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(stdout).map_err(|e| invalid(e.to_string()))?;

    let mut artifacts = BTreeMap::new();
    for (name, mut value) in raw {
        let Some(object) = value.as_object_mut() else {
            return Err(invalid(format!("'{name}' is not an object")));
        };
        object
            .entry("contractName")
            .or_insert_with(|| serde_json::Value::String(name.clone()));
        object
            .entry("fingerprint")
            .or_insert_with(|| serde_json::Value::String(ContentHash::from_bytes(b"").to_string()));
        let artifact: Artifact =
            serde_json::from_value(value).map_err(|e| invalid(format!("'{name}': {e}")))?;
        artifacts.insert(name, artifact);
    }
    Ok(artifacts)
}
