//! Core results and error types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated from.
///
/// Every error surfaced by Cerberus can be mapped onto one of these stages so that callers can
/// tell a bad input apart from a missing model without matching on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading or hex-decoding the caller's input.
    Input,
    /// Turning source code into bytecode.
    Compilation,
    /// Turning bytecode into instructions.
    Disassembly,
    /// Cleaning the instruction stream.
    Normalization,
    /// Building the graph and the feature vector.
    FeatureExtraction,
    /// Running the classifier and decoding its output.
    Classification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Compilation => "compilation",
            Stage::Disassembly => "disassembly",
            Stage::Normalization => "normalization",
            Stage::FeatureExtraction => "feature extraction",
            Stage::Classification => "classification",
        };
        f.write_str(name)
    }
}

/// Core error type encompassing all core module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The compiler ran but rejected the source.
    #[error("compilation failed: {0}")]
    Compilation(String),

    /// The compiler binary could not be started.
    #[error("could not run compiler '{binary}': {source}")]
    CompilerSpawn {
        /// Path or name of the compiler binary.
        binary: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Heimdall disassembly operation failed.
    #[error("disassembly failed: {0}")]
    Disassembly(String),

    /// Input decoded to zero bytes.
    #[error("bytecode is empty")]
    EmptyBytecode,

    /// Failed to read file at the specified path.
    #[error("could not read file '{path}': {source}")]
    FileRead {
        /// The path to the file that could not be read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode hex string.
    #[error("hex decode failed: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Failed to parse assembly at the specified line.
    #[error("assembly parse error at line {line}: {msg} ⇒ `{raw}`")]
    ParseError {
        /// The line number where parsing failed.
        line: usize,
        /// Description of the parsing error.
        msg: String,
        /// The raw content that failed to parse.
        raw: String,
    },
}

impl Error {
    /// Returns the pipeline stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Compilation(_) | Error::CompilerSpawn { .. } => Stage::Compilation,
            Error::Disassembly(_) | Error::ParseError { .. } => Stage::Disassembly,
            Error::EmptyBytecode | Error::FileRead { .. } | Error::HexDecode(_) => Stage::Input,
        }
    }
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
