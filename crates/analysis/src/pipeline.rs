//! End-to-end analysis: bytecode → instructions → cleaned sequence → features → label.

use crate::classify::{ClassificationAdapter, ClassificationResult};
use crate::features::{FeatureVector, assemble};
use crate::{Error, Result};
use cerberus_core::{
    Disassembler, Error as CoreError, GraphStats, HeimdallDisassembler, Instruction, build_graph,
    input_to_bytes, normalize,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Runs normalization, graph construction and feature assembly over a decoded instruction list.
pub fn extract_features(instructions: &[Instruction]) -> Result<FeatureVector> {
    let cleaned = normalize(instructions);
    let stats = build_graph(&cleaned).stats();
    assemble(&cleaned, &stats)
}

/// Every intermediate product of feature extraction for one contract.
#[derive(Clone, Debug, Serialize)]
pub struct Extraction {
    pub instructions: Vec<Instruction>,
    pub cleaned: Vec<String>,
    pub stats: GraphStats,
    pub features: FeatureVector,
}

impl Extraction {
    /// Builds the extraction from an already decoded instruction list.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Result<Self> {
        let cleaned = normalize(&instructions);
        debug!(
            "Normalized {} instructions into {} opcodes",
            instructions.len(),
            cleaned.len()
        );
        if cleaned.is_empty() {
            return Err(Error::EmptyOpcodeSequence);
        }

        let stats = build_graph(&cleaned).stats();
        debug!(
            "Sequence graph: {} nodes, {} edges",
            stats.num_nodes, stats.num_edges
        );

        let features = assemble(&cleaned, &stats)?;
        Ok(Self {
            instructions,
            cleaned,
            stats,
            features,
        })
    }
}

/// Extraction plus the classifier's verdict.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub extraction: Extraction,
    pub result: ClassificationResult,
}

/// Bundles a disassembler with the loaded classifier.
///
/// The analyzer holds no per-call state, so one instance can serve any number of concurrent
/// analyses.
#[derive(Clone, Debug)]
pub struct Analyzer<D = HeimdallDisassembler> {
    disassembler: D,
    adapter: ClassificationAdapter,
}

impl Analyzer<HeimdallDisassembler> {
    /// Analyzer using the Heimdall disassembler.
    pub fn heimdall(adapter: ClassificationAdapter) -> Self {
        Self::new(HeimdallDisassembler, adapter)
    }
}

impl<D: Disassembler> Analyzer<D> {
    pub fn new(disassembler: D, adapter: ClassificationAdapter) -> Self {
        Self {
            disassembler,
            adapter,
        }
    }

    pub fn adapter(&self) -> &ClassificationAdapter {
        &self.adapter
    }

    /// Disassembles raw bytecode and extracts its features.
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<Extraction> {
        let instructions = self.disassembler.disassemble(bytes).await?;
        debug!(
            "Disassembled {} bytes into {} instructions",
            bytes.len(),
            instructions.len()
        );
        Extraction::from_instructions(instructions)
    }

    /// Extracts features from a hex bytecode string.
    pub async fn extract(&self, hex: &str) -> Result<Extraction> {
        let bytes = input_to_bytes(hex, false)?;
        self.extract_bytes(&bytes).await
    }

    /// Extracts features from a file holding hex bytecode.
    pub async fn extract_file(&self, path: &Path) -> Result<Extraction> {
        let hex = fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        let bytes = input_to_bytes(&hex, false)?;
        self.extract_bytes(&bytes).await
    }

    /// Extracts features from raw bytecode and classifies them.
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> Result<Analysis> {
        let extraction = self.extract_bytes(bytes).await?;
        self.finish(extraction)
    }

    /// Extracts features from a hex bytecode string and classifies them.
    pub async fn analyze(&self, hex: &str) -> Result<Analysis> {
        let extraction = self.extract(hex).await?;
        self.finish(extraction)
    }

    /// Extracts features from a hex bytecode file and classifies them.
    pub async fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let extraction = self.extract_file(path).await?;
        self.finish(extraction)
    }

    fn finish(&self, extraction: Extraction) -> Result<Analysis> {
        let result = self.adapter.classify(&extraction.features)?;
        Ok(Analysis { extraction, result })
    }
}
