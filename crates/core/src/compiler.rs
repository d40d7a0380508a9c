//! Source-to-bytecode collaborator.
//!
//! Cerberus does not compile Solidity itself. It drives an existing `solc` binary and picks the
//! emitted creation bytecode out of its `--bin` output. Installing or switching compiler
//! versions is left to the caller's toolchain.

use crate::result::{Error, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Capability that turns contract source code into deployable bytecode.
pub trait Compiler: Send + Sync {
    /// Compiles `source`, optionally pinning the compiler `version`.
    fn compile(&self, source: &str, version: Option<&str>, optimize: bool) -> Result<Vec<u8>>;
}

/// [`Compiler`] that shells out to a `solc` binary.
#[derive(Clone, Debug)]
pub struct SolcCompiler {
    binary: PathBuf,
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self::new("solc")
    }
}

impl SolcCompiler {
    /// Uses the compiler found at `binary` (a path or a name resolved through `PATH`).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn binary_name(&self) -> String {
        self.binary.display().to_string()
    }

    /// Returns the raw `solc --version` output.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|source| Error::CompilerSpawn {
                binary: self.binary_name(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Compiler for SolcCompiler {
    fn compile(&self, source: &str, version: Option<&str>, optimize: bool) -> Result<Vec<u8>> {
        if let Some(wanted) = version {
            let output = self.version()?;
            let reported = reported_version(&output);
            if reported != Some(wanted.trim()) {
                return Err(Error::Compilation(format!(
                    "{} reports solc {}, expected {wanted}",
                    self.binary_name(),
                    reported.unwrap_or("of unknown version")
                )));
            }
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--bin");
        if optimize {
            cmd.arg("--optimize");
        }
        cmd.arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| Error::CompilerSpawn {
            binary: self.binary_name(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|source| Error::CompilerSpawn {
                    binary: self.binary_name(),
                    source,
                })?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| Error::CompilerSpawn {
                binary: self.binary_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Compilation(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let contracts = parse_bin_output(&stdout);
        let Some((name, hex_code)) = contracts.last() else {
            return Err(Error::Compilation("compiler emitted no bytecode".into()));
        };
        tracing::debug!(
            "Compiled {} contract(s), using '{}' ({} hex chars)",
            contracts.len(),
            name,
            hex_code.len()
        );
        Ok(hex::decode(hex_code)?)
    }
}

/// Pulls `X.Y.Z` out of the `Version: X.Y.Z+commit...` line of `solc --version`.
pub fn reported_version(output: &str) -> Option<&str> {
    let line = output.lines().find_map(|l| l.trim().strip_prefix("Version:"))?;
    let version = line.split_whitespace().next()?;
    version.split('+').next().filter(|v| !v.is_empty())
}

/// Extracts `(contract, hex)` pairs from `solc --bin` output.
///
/// Contracts without bytecode (interfaces, abstract contracts) are skipped.
pub fn parse_bin_output(stdout: &str) -> Vec<(String, String)> {
    let mut contracts = Vec::new();
    let mut current: Option<String> = None;
    let mut lines = stdout.lines();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if let Some(header) = line
            .strip_prefix("=======")
            .and_then(|rest| rest.strip_suffix("======="))
        {
            let header = header.trim();
            let name = header.rsplit(':').next().unwrap_or(header);
            current = Some(name.to_string());
        } else if line == "Binary:" {
            let code = lines.next().map(str::trim).unwrap_or("");
            if let Some(name) = current.take()
                && !code.is_empty()
            {
                contracts.push((name, code.to_string()));
            }
        }
    }
    contracts
}
