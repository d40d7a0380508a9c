//! Opcode normalization: raw disassembler output to a canonical mnemonic sequence.
//!
//! The cleaned sequence is what every downstream statistic is computed over, so its shape is
//! part of the model contract: undecodable entries are dropped and parametrized mnemonics
//! collapse onto their family name (`PUSH12` → `PUSH`, `DUP3` → `DUP`).

use crate::decoder::Instruction;

/// Prefixes that mark bytes the disassembler could not decode.
const UNDECODABLE_PREFIXES: [&str; 2] = ["INVALID", "UNKNOWN"];

/// Cleans a disassembled instruction stream into canonical mnemonics.
///
/// Returns an empty vector when nothing survives; callers treat that as "no features
/// extractable" rather than a failure of this function.
pub fn normalize(instructions: &[Instruction]) -> Vec<String> {
    normalize_mnemonics(instructions.iter().map(|ins| ins.mnemonic.as_str()))
}

/// Same as [`normalize`], over bare mnemonic strings.
pub fn normalize_mnemonics<I, S>(mnemonics: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut dropped = 0usize;
    let cleaned: Vec<String> = mnemonics
        .into_iter()
        .filter_map(|m| {
            let canonical = canonical(m.as_ref());
            if canonical.is_none() {
                dropped += 1;
            }
            canonical
        })
        .collect();

    if dropped > 0 {
        tracing::debug!(
            "Dropped {} undecodable or empty mnemonics, kept {}",
            dropped,
            cleaned.len()
        );
    }
    cleaned
}

/// Canonical form of one mnemonic, or `None` if it must be dropped.
fn canonical(mnemonic: &str) -> Option<String> {
    let upper = mnemonic.trim().to_ascii_uppercase();
    if upper.is_empty() || is_undecodable(&upper) {
        return None;
    }

    let stem = upper.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

fn is_undecodable(upper: &str) -> bool {
    UNDECODABLE_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}
