use cerberus_cli::commands::{Cmd, Command};
use clap::{ArgAction, Parser};
use tracing::Level;

/// Cerberus CLI
///
/// Cerberus classifies EVM bytecode into vulnerability categories from graph and opcode
/// statistics of its disassembly, and exposes each intermediate step for inspection.
#[derive(Parser)]
#[command(name = "cerberus")]
#[command(about = "Cerberus: EVM bytecode vulnerability classifier")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Cerberus CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute().await
}
