pub mod classify;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod scan;

pub use classify::{
    ClassificationAdapter, ClassificationResult, RawLabel, Severity, VulnerabilityLabel,
};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, OpcodeCategory, assemble};
pub use model::{Classifier, ModelArtifact, ModelConfig};
pub use pipeline::{Analysis, Analyzer, Extraction, extract_features};
pub use scan::{DEFAULT_CONFIDENCE_THRESHOLD, ScanSummary, scan_directory};

use cerberus_core::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for feature extraction and classification.
#[derive(Debug, Error)]
pub enum Error {
    /// Input, compilation or disassembly failed in the core crate.
    #[error(transparent)]
    Core(#[from] cerberus_core::Error),
    /// Nothing was left to analyse after normalization.
    #[error("no analysable opcodes remain after normalization")]
    EmptyOpcodeSequence,
    /// The classifier is not loaded or its artifact could not be read.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// The classifier returned output that does not fit the label space.
    #[error("malformed prediction: {0}")]
    MalformedPrediction(String),
    /// A directory scan could not list its input.
    #[error("could not read directory '{path}': {source}")]
    ScanDirectory {
        /// Directory being scanned.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns the pipeline stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Core(inner) => inner.stage(),
            Error::EmptyOpcodeSequence => Stage::Normalization,
            Error::ModelUnavailable(_) | Error::MalformedPrediction(_) => Stage::Classification,
            Error::ScanDirectory { .. } => Stage::Input,
        }
    }
}

/// Analysis result type
pub type Result<T> = std::result::Result<T, Error>;
