#![allow(dead_code)]

use async_trait::async_trait;
use cerberus_core::{Disassembler, Error, Instruction, Result};
use std::path::{Path, PathBuf};

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Decodes the handful of opcodes the fixtures use without calling out to Heimdall.
pub struct TableDisassembler;

#[async_trait]
impl Disassembler for TableDisassembler {
    async fn disassemble(&self, bytes: &[u8]) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        let mut pc = 0;
        while pc < bytes.len() {
            let op = bytes[pc];
            if (0x60..=0x7f).contains(&op) {
                let width = (op - 0x5f) as usize;
                let end = (pc + 1 + width).min(bytes.len());
                let imm: String = bytes[pc + 1..end].iter().map(|b| format!("{b:02x}")).collect();
                out.push(Instruction::with_immediate(pc, format!("PUSH{width}"), imm));
                pc = end;
                continue;
            }
            let mnemonic = match op {
                0x00 => "STOP".to_string(),
                0x01 => "ADD".to_string(),
                0x10 => "LT".to_string(),
                0x33 => "CALLER".to_string(),
                0x45 => "GASLIMIT".to_string(),
                0x52 => "MSTORE".to_string(),
                0x54 => "SLOAD".to_string(),
                0x55 => "SSTORE".to_string(),
                0x56 => "JUMP".to_string(),
                0x57 => "JUMPI".to_string(),
                0x5b => "JUMPDEST".to_string(),
                0xf1 => "CALL".to_string(),
                0xfd => "REVERT".to_string(),
                0xfe => "INVALID".to_string(),
                other => format!("UNKNOWN_0x{other:02x}"),
            };
            out.push(Instruction::new(pc, mnemonic));
            pc += 1;
        }
        Ok(out)
    }
}

/// Disassembler that always fails.
pub struct BrokenDisassembler;

#[async_trait]
impl Disassembler for BrokenDisassembler {
    async fn disassemble(&self, _bytes: &[u8]) -> Result<Vec<Instruction>> {
        Err(Error::Disassembly("backend offline".into()))
    }
}
