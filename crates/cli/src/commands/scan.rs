//! Classifies every bytecode file in a directory and prints the per-label summary.

use async_trait::async_trait;
use cerberus_analysis::{DEFAULT_CONFIDENCE_THRESHOLD, scan_directory};
use clap::Args;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Arguments for the `scan` subcommand.
#[derive(Args)]
pub struct ScanArgs {
    /// Directory holding one hex bytecode file per contract.
    pub dir: PathBuf,
    /// Model artifact (default: $CERBERUS_MODEL or ./.cerberus/models/model.json).
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// Minimum confidence for a verdict to count towards its label.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f64,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
    /// Also write the summary to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[async_trait]
impl super::Command for ScanArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let analyzer = super::load_analyzer(self.model)?;
        let summary = scan_directory(&analyzer, &self.dir, self.threshold).await?;

        let report = if self.json {
            serde_json::to_string_pretty(&summary)?
        } else {
            summary.to_string()
        };
        if let Some(out_path) = self.output {
            fs::write(out_path, &report)?;
        }
        println!("{report}");
        Ok(())
    }
}
