//! Classifies a single contract, given either as bytecode or as Solidity source compiled
//! through `solc` first.

use async_trait::async_trait;
use cerberus_analysis::{ClassificationResult, DEFAULT_CONFIDENCE_THRESHOLD, VulnerabilityLabel};
use cerberus_core::compiler::{Compiler, SolcCompiler};
use clap::Args;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the `classify` subcommand.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input bytecode as a hex string (0x...) or file path containing EVM bytecode.
    #[arg(required_unless_present = "source", conflicts_with = "source")]
    pub input: Option<String>,
    /// Solidity source file to compile and classify instead of bytecode.
    #[arg(long, value_name = "FILE")]
    source: Option<PathBuf>,
    /// Compiler binary used with --source.
    #[arg(long, value_name = "PATH", default_value = "solc")]
    solc: PathBuf,
    /// Required compiler version; compilation fails if `solc --version` does not match.
    #[arg(long, value_name = "VERSION")]
    solc_version: Option<String>,
    /// Compile with the optimizer enabled.
    #[arg(long)]
    optimize: bool,
    /// Model artifact (default: $CERBERUS_MODEL or ./.cerberus/models/model.json).
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// Minimum confidence for a definite verdict.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f64,
    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[async_trait]
impl super::Command for ClassifyArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let analyzer = super::load_analyzer(self.model)?;

        let analysis = if let Some(source_path) = &self.source {
            let source = fs::read_to_string(source_path)?;
            let compiler = SolcCompiler::new(self.solc.clone());
            let bytecode =
                compiler.compile(&source, self.solc_version.as_deref(), self.optimize)?;
            tracing::info!(
                "Compiled {} into {} bytes",
                source_path.display(),
                bytecode.len()
            );
            analyzer.analyze_bytes(&bytecode).await?
        } else {
            let input = self.input.as_deref().unwrap_or_default();
            if super::is_file_input(input) {
                analyzer.analyze_file(Path::new(input)).await?
            } else {
                analyzer.analyze(input).await?
            }
        };

        let result = &analysis.result;
        if self.json {
            let json = serde_json::json!({
                "label": result.label,
                "description": result.label.description(),
                "severity": result.severity,
                "confidence": result.confidence,
                "confident": result.is_confident(self.threshold),
                "probabilities": result.probabilities,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        } else {
            print!("{}", render(result, self.threshold));
        }
        Ok(())
    }
}

/// Plain text report of a classification.
fn render(result: &ClassificationResult, threshold: f64) -> String {
    let verdict = if result.is_confident(threshold) {
        format!("{} ({})", result.label.description(), result.severity)
    } else {
        format!("uncertain (best guess: {})", result.label.description())
    };

    let mut out = format!(
        "Verdict:    {verdict}\nConfidence: {:.2}\n",
        result.confidence
    );
    for label in VulnerabilityLabel::ALL {
        out.push_str(&format!(
            "  {:<18} {:.4}\n",
            label.description(),
            result.probability(label)
        ));
    }
    out
}
