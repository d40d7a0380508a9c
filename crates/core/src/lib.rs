pub mod compiler;
pub mod decoder;
pub mod graph;
pub mod normalize;
pub mod result;

pub use decoder::{Disassembler, HeimdallDisassembler, Instruction};
pub use graph::{GraphStats, SequenceGraph, build_graph};
pub use normalize::normalize;
pub use result::{Error, Result, Stage};

use std::fs;

/// Normalizes a user supplied hex string into bare lowercase hex digits.
///
/// Surrounding whitespace, a leading `0x`/`0X`, interior whitespace and `_` digit separators are
/// removed. The result is not validated; `hex::decode` reports bad digits and odd lengths.
pub fn normalize_hex_string(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let normalized: String = body
        .chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if normalized.len() % 2 != 0 {
        return Err(Error::HexDecode(hex::FromHexError::OddLength));
    }
    Ok(normalized)
}

/// Converts a hex string, or the path of a file holding one, into raw bytes.
///
/// # Arguments
/// * `input` - Hex-encoded bytecode (with or without "0x" prefix) or a file path.
/// * `is_file` - Whether `input` names a file rather than holding the hex itself.
pub fn input_to_bytes(input: &str, is_file: bool) -> Result<Vec<u8>> {
    let hex_str = if is_file {
        fs::read_to_string(input).map_err(|source| Error::FileRead {
            path: input.to_string(),
            source,
        })?
    } else {
        input.to_string()
    };

    let normalized = normalize_hex_string(&hex_str)?;
    let bytes = hex::decode(normalized)?;
    if bytes.is_empty() {
        return Err(Error::EmptyBytecode);
    }
    Ok(bytes)
}
