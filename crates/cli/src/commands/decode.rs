//! Decodes input bytecode and prints the instruction stream, followed by the normalized opcode
//! sequence that feature extraction works on.

use async_trait::async_trait;
use cerberus_core::decoder::decode_bytecode;
use cerberus_core::normalize;
use clap::Args;
use std::error::Error;

/// Arguments for the `decode` subcommand.
#[derive(Args)]
pub struct DecodeArgs {
    /// Input bytecode as a hex string (0x...) or file path containing EVM bytecode.
    pub input: String,
    /// Also print the raw Heimdall assembly.
    #[arg(long)]
    raw: bool,
}

/// Executes the `decode` subcommand to decode bytecode.
#[async_trait]
impl super::Command for DecodeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let is_file = super::is_file_input(&self.input);
        let (instructions, info, asm, _) = decode_bytecode(&self.input, is_file).await?;

        println!(
            "; {} bytes, keccak256 0x{}",
            info.byte_length,
            hex::encode(info.keccak_hash)
        );
        if self.raw {
            println!("{asm}");
        }
        for instruction in &instructions {
            println!("{instruction}");
        }
        let covered: usize = instructions.iter().map(|i| i.byte_size()).sum();
        if covered != info.byte_length {
            tracing::warn!(
                "Instructions cover {} of {} bytes",
                covered,
                info.byte_length
            );
        }

        let cleaned = normalize(&instructions);
        println!();
        println!("; normalized ({} of {} kept)", cleaned.len(), instructions.len());
        println!("{}", cleaned.join(" "));
        Ok(())
    }
}
