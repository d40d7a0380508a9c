//! Prints the feature vector of a contract as a JSON object, keyed by feature name in model
//! input order.

use async_trait::async_trait;
use clap::Args;
use std::error::Error;
use std::path::Path;

/// Arguments for the `features` subcommand.
#[derive(Args)]
pub struct FeaturesArgs {
    /// Input bytecode as a hex string (0x...) or file path containing EVM bytecode.
    pub input: String,
    /// Include the cleaned opcode sequence and graph statistics.
    #[arg(long)]
    full: bool,
}

#[async_trait]
impl super::Command for FeaturesArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let analyzer = super::extraction_only();
        let extraction = if super::is_file_input(&self.input) {
            analyzer.extract_file(Path::new(&self.input)).await?
        } else {
            analyzer.extract(&self.input).await?
        };

        let json = if self.full {
            serde_json::json!({
                "cleaned": extraction.cleaned,
                "stats": extraction.stats,
                "features": extraction.features,
            })
        } else {
            serde_json::to_value(extraction.features)?
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(())
    }
}
