//! Cerberus' single entry-point for turning byte-sequences into Heimdall instruction streams.

use crate::result::{Error, Result};
use async_trait::async_trait;
use heimdall::{DisassemblerArgsBuilder, disassemble};
use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

/// Mnemonic the disassembler emits for bytes it cannot decode.
const UNKNOWN_MNEMONIC: &str = "UNKNOWN";

/// Single disassembled EVM instruction with PC, mnemonic, and optional immediate data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Program counter (byte offset)
    pub pc: usize,
    /// Opcode mnemonic as reported by the disassembler, upper-cased (e.g. `PUSH12`)
    pub mnemonic: String,
    /// Immediate data (hex string without 0x prefix)
    pub imm: Option<String>,
}

impl Instruction {
    /// Builds an instruction without immediate data.
    pub fn new(pc: usize, mnemonic: impl Into<String>) -> Self {
        Self {
            pc,
            mnemonic: mnemonic.into(),
            imm: None,
        }
    }

    /// Builds an instruction carrying an immediate operand.
    pub fn with_immediate(pc: usize, mnemonic: impl Into<String>, imm: impl Into<String>) -> Self {
        Self {
            pc,
            mnemonic: mnemonic.into(),
            imm: Some(imm.into()),
        }
    }

    /// Width of the immediate operand in bytes, if the instruction carries one.
    #[inline]
    pub fn immediate_width(&self) -> Option<usize> {
        self.imm.as_ref().map(|imm| imm.len().div_ceil(2))
    }

    /// Returns the byte size of this instruction (1 for most opcodes, 1+N for PUSH(N)).
    #[inline]
    pub fn byte_size(&self) -> usize {
        1 + self.immediate_width().unwrap_or(0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pc: six-digit hex, mnemonic left-padded to 8 chars, then optional imm
        if let Some(immediate) = &self.imm {
            write!(f, "{:06x}  {:<8} {}", self.pc, self.mnemonic, immediate)
        } else {
            write!(f, "{:06x}  {}", self.pc, self.mnemonic)
        }
    }
}

/// Capability that turns raw bytecode into an instruction stream.
///
/// Cerberus never decodes opcodes itself; analyses take any implementation of this trait so
/// the disassembler can be swapped out or faked in tests.
#[async_trait]
pub trait Disassembler: Send + Sync {
    /// Disassembles `bytes` into instructions in program-counter order.
    async fn disassemble(&self, bytes: &[u8]) -> Result<Vec<Instruction>>;
}

/// [`Disassembler`] backed by the Heimdall disassembler.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeimdallDisassembler;

#[async_trait]
impl Disassembler for HeimdallDisassembler {
    async fn disassemble(&self, bytes: &[u8]) -> Result<Vec<Instruction>> {
        let asm = run_heimdall(bytes).await?;
        let mut instructions = parse_assembly(&asm)?;
        recover_unknown_bytes(&mut instructions, bytes);
        Ok(instructions)
    }
}

/// Decoded bytecode metadata (length, hash, source).
#[derive(Debug)]
pub struct DecodeInfo {
    /// Bytecode length in bytes
    pub byte_length: usize,
    /// Keccak-256 hash
    pub keccak_hash: [u8; 32],
    /// Input source type
    pub source: SourceType,
}

/// Bytecode input source type.
#[derive(Debug, PartialEq, Eq)]
pub enum SourceType {
    HexString,
    File,
}

/// Decodes raw EVM bytecode into an instruction stream with metadata and raw assembly.
pub async fn decode_bytecode(
    input: &str,
    is_file: bool,
) -> Result<(Vec<Instruction>, DecodeInfo, String, Vec<u8>)> {
    let bytes = crate::input_to_bytes(input, is_file)?;
    let source = if is_file {
        SourceType::File
    } else {
        SourceType::HexString
    };

    let byte_length = bytes.len();
    let mut keccak = Keccak::v256();
    keccak.update(&bytes);
    let mut hash = [0u8; 32];
    keccak.finalize(&mut hash);

    let asm = run_heimdall(&bytes).await?;
    let mut instructions = parse_assembly(&asm)?;
    recover_unknown_bytes(&mut instructions, &bytes);

    Ok((
        instructions,
        DecodeInfo {
            byte_length,
            keccak_hash: hash,
            source,
        },
        asm,
        bytes,
    ))
}

async fn run_heimdall(bytes: &[u8]) -> Result<String> {
    let target_arg = format!("0x{}", hex::encode(bytes));
    let args = DisassemblerArgsBuilder::new()
        .target(target_arg)
        .output("print".into())
        .decimal_counter(false)
        .build()
        .map_err(|e| Error::Disassembly(e.to_string()))?;

    disassemble(args)
        .await
        .map_err(|e| Error::Disassembly(e.to_string()))
}

/// Parses Heimdall assembly output into structured instructions.
pub fn parse_assembly(asm: &str) -> Result<Vec<Instruction>> {
    // Fail on empty assembly
    if asm.trim().is_empty() {
        return Err(Error::ParseError {
            line: 0,
            msg: "empty assembly".into(),
            raw: asm.to_string(),
        });
    }

    let mut instructions = Vec::new();
    for (line_no, raw) in asm.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with("label_") {
            continue; // Skip blank lines and label lines
        }

        let mut parts = line.split_whitespace();
        let pc_hex = parts.next().ok_or_else(|| Error::ParseError {
            line: line_no,
            msg: "missing PC".to_string(),
            raw: raw.to_string(),
        })?;
        let opcode = parts.next().ok_or_else(|| Error::ParseError {
            line: line_no,
            msg: "missing opcode".to_string(),
            raw: raw.to_string(),
        })?;
        let immediate = parts
            .next()
            .map(|s| s.trim_start_matches("0x").to_ascii_lowercase());

        let pc = usize::from_str_radix(pc_hex.trim_start_matches("0x"), 16).map_err(|_| {
            Error::ParseError {
                line: line_no,
                msg: "invalid PC".to_string(),
                raw: raw.to_string(),
            }
        })?;

        if opcode.chars().all(|c| !c.is_alphanumeric()) {
            return Err(Error::ParseError {
                line: line_no,
                msg: "invalid opcode".to_string(),
                raw: raw.to_string(),
            });
        }

        instructions.push(Instruction {
            pc,
            mnemonic: canonical_mnemonic(opcode),
            imm: immediate,
        });
    }
    Ok(instructions)
}

/// Upper-cases a mnemonic, keeping the hex byte of `UNKNOWN_0x??` markers lowercase.
fn canonical_mnemonic(opcode: &str) -> String {
    let upper = opcode.to_ascii_uppercase();
    match upper.strip_prefix("UNKNOWN_0X") {
        Some(hex_part) => format!("UNKNOWN_0x{}", hex_part.to_ascii_lowercase()),
        None => upper,
    }
}

/// Rewrites bare `UNKNOWN` markers into `UNKNOWN_0x??` using the byte found at their PC.
///
/// Heimdall sometimes reports undecodable bytes without their value. The input bytes are
/// the only place that value survives, so it is looked up by program counter. Markers whose
/// PC falls outside `bytes` are left untouched.
fn recover_unknown_bytes(instructions: &mut [Instruction], bytes: &[u8]) {
    for instruction in instructions
        .iter_mut()
        .filter(|ins| ins.mnemonic == UNKNOWN_MNEMONIC)
    {
        match bytes.get(instruction.pc) {
            Some(byte) => {
                tracing::debug!(
                    "Unknown opcode at PC 0x{:x}, recovered byte 0x{:02x}",
                    instruction.pc,
                    byte
                );
                instruction.mnemonic = format!("UNKNOWN_0x{byte:02x}");
            }
            None => tracing::warn!(
                "Unknown opcode at PC 0x{:x} lies outside the bytecode ({} bytes)",
                instruction.pc,
                bytes.len()
            ),
        }
    }
}
