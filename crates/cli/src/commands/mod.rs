use async_trait::async_trait;
use cerberus_analysis::{Analyzer, ClassificationAdapter, ModelConfig};
use clap::Subcommand;
use std::error::Error;
use std::path::{Path, PathBuf};

pub mod cfg;
pub mod classify;
pub mod decode;
pub mod features;
pub mod scan;

/// CLI subcommands for Cerberus.
#[derive(Subcommand)]
pub enum Cmd {
    /// Decode bytecode to instructions and the normalized opcode sequence.
    Decode(decode::DecodeArgs),
    /// Print the named feature vector as JSON.
    Features(features::FeaturesArgs),
    /// Write the opcode sequence graph as Graphviz .dot.
    Cfg(cfg::CfgArgs),
    /// Classify one contract.
    Classify(classify::ClassifyArgs),
    /// Classify every bytecode file in a directory and summarize.
    Scan(scan::ScanArgs),
}

/// Trait for executing CLI subcommands.
///
/// Implementors take bytecode input and print their result to stdout.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    ///
    /// # Returns
    /// A `Result` indicating success or an error if execution fails.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Decode(args) => args.execute().await,
            Cmd::Features(args) => args.execute().await,
            Cmd::Cfg(args) => args.execute().await,
            Cmd::Classify(args) => args.execute().await,
            Cmd::Scan(args) => args.execute().await,
        }
    }
}

/// Whether `input` names an existing file rather than holding hex itself.
pub fn is_file_input(input: &str) -> bool {
    !input.starts_with("0x") && Path::new(input).is_file()
}

/// Builds a Heimdall-backed analyzer with the model at `model` (or the default location).
pub fn load_analyzer(model: Option<PathBuf>) -> Result<Analyzer, Box<dyn Error>> {
    let config = ModelConfig::resolve(model);
    let adapter = ClassificationAdapter::from_config(&config)?;
    Ok(Analyzer::heimdall(adapter))
}

/// Builds an analyzer without a model, for commands that stop before classification.
pub fn extraction_only() -> Analyzer {
    Analyzer::heimdall(ClassificationAdapter::unloaded())
}
