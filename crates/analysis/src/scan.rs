//! Directory scan: classify every bytecode file in a folder and aggregate the verdicts.
//!
//! Each regular file directly inside the directory is read as hex bytecode. Verdicts below the
//! confidence threshold go to the "uncertain" bucket. Files that cannot be read or analysed are
//! recorded as failures and never abort the scan. Input files are only read.

use crate::classify::{ClassificationResult, VulnerabilityLabel};
use crate::pipeline::Analyzer;
use crate::{Error, Result};
use cerberus_core::{Disassembler, Stage};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default minimum confidence for a verdict to count towards its label.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

const UNCERTAIN: &str = "uncertain";

/// One classified contract.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContractScore {
    /// File stem of the scanned file.
    pub contract: String,
    pub confidence: f64,
}

/// Contracts that ended up in one bucket.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    /// Label key, or `"uncertain"`.
    pub name: String,
    /// `None` for the uncertain bucket.
    pub label: Option<VulnerabilityLabel>,
    pub count: usize,
    /// Share of all classified contracts, in percent.
    pub percentage: f64,
    pub contracts: Vec<ContractScore>,
}

impl Bucket {
    fn new(label: Option<VulnerabilityLabel>) -> Self {
        let name = match label {
            Some(label) => label.key().to_string(),
            None => UNCERTAIN.to_string(),
        };
        Self {
            name,
            label,
            count: 0,
            percentage: 0.0,
            contracts: Vec::new(),
        }
    }

    fn title(&self) -> &'static str {
        match self.label {
            Some(label) => label.description(),
            None => "Uncertain",
        }
    }
}

/// File that could not be classified.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub stage: Stage,
    pub error: String,
}

/// Aggregated verdicts of a directory scan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanSummary {
    pub threshold: f64,
    /// Number of classified contracts, uncertain ones included.
    pub total: usize,
    /// One bucket per label in label order, then the uncertain bucket.
    pub buckets: Vec<Bucket>,
    pub failures: Vec<ScanFailure>,
}

impl ScanSummary {
    pub fn new(threshold: f64) -> Self {
        let buckets = VulnerabilityLabel::ALL
            .iter()
            .map(|&label| Bucket::new(Some(label)))
            .chain(std::iter::once(Bucket::new(None)))
            .collect();
        Self {
            threshold,
            total: 0,
            buckets,
            failures: Vec::new(),
        }
    }

    /// Files the bucket for `label` (`None` is the uncertain bucket).
    pub fn bucket(&self, label: Option<VulnerabilityLabel>) -> &Bucket {
        let idx = label.map_or(VulnerabilityLabel::ALL.len(), VulnerabilityLabel::index);
        &self.buckets[idx]
    }

    /// Adds a verdict, moving it to the uncertain bucket when below the threshold.
    pub fn record(&mut self, contract: impl Into<String>, result: &ClassificationResult) {
        let label = result
            .is_confident(self.threshold)
            .then_some(result.label);
        let idx = label.map_or(VulnerabilityLabel::ALL.len(), VulnerabilityLabel::index);

        let bucket = &mut self.buckets[idx];
        bucket.count += 1;
        bucket.contracts.push(ContractScore {
            contract: contract.into(),
            confidence: result.confidence,
        });
        self.total += 1;

        for bucket in &mut self.buckets {
            bucket.percentage = bucket.count as f64 / self.total as f64 * 100.0;
        }
    }

    pub fn record_failure(&mut self, path: impl Into<PathBuf>, error: &Error) {
        self.failures.push(ScanFailure {
            path: path.into(),
            stage: error.stage(),
            error: error.to_string(),
        });
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vulnerability Type Analysis Summary")?;
        writeln!(f, "===================================")?;
        writeln!(
            f,
            "{} contracts classified (confidence threshold {:.2})",
            self.total, self.threshold
        )?;

        for bucket in &self.buckets {
            writeln!(f)?;
            writeln!(f, "{}:", bucket.title())?;
            writeln!(f, "  Count: {}", bucket.count)?;
            writeln!(f, "  Percentage: {:.2}%", bucket.percentage)?;
            if !bucket.contracts.is_empty() {
                writeln!(f, "  Contracts:")?;
                for c in &bucket.contracts {
                    writeln!(f, "    - {} (confidence: {:.2})", c.contract, c.confidence)?;
                }
            }
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures: {}", self.failures.len())?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  - {} [{}] {}",
                    failure.path.display(),
                    failure.stage,
                    failure.error
                )?;
            }
        }
        Ok(())
    }
}

/// Classifies every regular file directly inside `dir`, in file name order.
///
/// Only failing to list `dir` is an error; per-file problems end up in
/// [`ScanSummary::failures`].
pub async fn scan_directory<D: Disassembler>(
    analyzer: &Analyzer<D>,
    dir: &Path,
    threshold: f64,
) -> Result<ScanSummary> {
    let dir_error = |source: std::io::Error| Error::ScanDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    info!("Scanning {} files in {}", files.len(), dir.display());

    let mut summary = ScanSummary::new(threshold);
    for path in files {
        let contract = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match analyzer.analyze_file(&path).await {
            Ok(analysis) => {
                debug!(
                    "{}: {} ({:.2})",
                    contract, analysis.result.label, analysis.result.confidence
                );
                summary.record(contract, &analysis.result);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.record_failure(path, &e);
            }
        }
    }

    Ok(summary)
}
