//! Fixed-layout feature vector for the vulnerability classifier.
//!
//! The vector combines sequence-graph statistics, the share of opcodes falling into ten
//! instruction categories, and a handful of composite metrics derived from both. Its length
//! and ordering are the input contract of every trained model, so [`FEATURE_NAMES`] must never
//! be reordered.
//!
//! # Usage
//! ```rust,ignore
//! let cleaned = cerberus_core::normalize(&instructions);
//! let stats = cerberus_core::build_graph(&cleaned).stats();
//! let features = features::assemble(&cleaned, &stats)?;
//! println!("{}", serde_json::to_string_pretty(&features)?);
//! ```

use crate::{Error, Result};
use cerberus_core::GraphStats;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of entries in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 25;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "num_nodes",
    "num_edges",
    "max_in_degree",
    "max_out_degree",
    "avg_in_degree",
    "avg_out_degree",
    "density",
    "clustering_coefficient",
    "arithmetic_ratio",
    "bitwise_ratio",
    "comparison_ratio",
    "memory_ratio",
    "storage_ratio",
    "control_ratio",
    "stack_ratio",
    "system_ratio",
    "block_ratio",
    "environment_ratio",
    "jumps_to_pushes_ratio",
    "calls_ratio",
    "storage_to_memory_ratio",
    "avg_block_depth",
    "cyclomatic_complexity",
    "halstead_difficulty",
    "maintainability_index",
];

/// Opcodes that add a decision point to the cyclomatic complexity estimate.
const BRANCHING_OPCODES: [&str; 2] = ["JUMPI", "REVERT"];

/// Instruction categories counted by the assembler.
///
/// Membership is tested by substring: an opcode belongs to a category when its name contains
/// any member token. `ADDRESS` therefore counts as arithmetic (it contains `ADD`) and
/// `CALLVALUE` as system (it contains `CALL`); trained models depend on this overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpcodeCategory {
    Arithmetic,
    Bitwise,
    Comparison,
    Memory,
    Storage,
    Control,
    Stack,
    System,
    Block,
    Environment,
}

impl OpcodeCategory {
    /// All categories in feature-vector order.
    pub const ALL: [OpcodeCategory; 10] = [
        OpcodeCategory::Arithmetic,
        OpcodeCategory::Bitwise,
        OpcodeCategory::Comparison,
        OpcodeCategory::Memory,
        OpcodeCategory::Storage,
        OpcodeCategory::Control,
        OpcodeCategory::Stack,
        OpcodeCategory::System,
        OpcodeCategory::Block,
        OpcodeCategory::Environment,
    ];

    /// Member tokens of the category.
    pub fn members(self) -> &'static [&'static str] {
        match self {
            OpcodeCategory::Arithmetic => &[
                "ADD", "MUL", "SUB", "DIV", "SDIV", "MOD", "SMOD", "ADDMOD", "MULMOD", "EXP",
            ],
            OpcodeCategory::Bitwise => &["AND", "OR", "XOR", "NOT", "BYTE", "SHL", "SHR", "SAR"],
            OpcodeCategory::Comparison => &["LT", "GT", "SLT", "SGT", "EQ", "ISZERO"],
            OpcodeCategory::Memory => &["MLOAD", "MSTORE", "MSTORE8", "MSIZE", "MCOPY"],
            OpcodeCategory::Storage => &["SLOAD", "SSTORE"],
            OpcodeCategory::Control => &["JUMP", "JUMPI", "JUMPDEST", "PC", "GAS"],
            OpcodeCategory::Stack => &["POP", "PUSH", "DUP", "SWAP"],
            OpcodeCategory::System => &[
                "CREATE",
                "CALL",
                "CALLCODE",
                "RETURN",
                "DELEGATECALL",
                "STATICCALL",
                "REVERT",
            ],
            OpcodeCategory::Block => &[
                "BLOCKHASH",
                "COINBASE",
                "TIMESTAMP",
                "NUMBER",
                "DIFFICULTY",
                "GASLIMIT",
            ],
            OpcodeCategory::Environment => &[
                "ADDRESS",
                "BALANCE",
                "ORIGIN",
                "CALLER",
                "CALLVALUE",
                "CALLDATALOAD",
                "CALLDATASIZE",
                "CODESIZE",
                "GASPRICE",
            ],
        }
    }

    /// Whether `opcode` falls into this category.
    pub fn contains(self, opcode: &str) -> bool {
        self.members().iter().any(|token| opcode.contains(token))
    }

    /// Share of `cleaned` falling into this category, 0 for an empty sequence.
    pub fn ratio(self, cleaned: &[String]) -> f64 {
        let count = cleaned.iter().filter(|op| self.contains(op)).count();
        safe_div(count as f64, cleaned.len() as f64)
    }

    /// Name of the ratio feature for this category.
    pub fn feature_name(self) -> &'static str {
        FEATURE_NAMES[8 + self as usize]
    }
}

/// Ordered, fixed-length numeric summary of an opcode sequence.
#[derive(Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wraps raw values that already follow the [`FEATURE_NAMES`] order.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Looks up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// `(name, value)` pairs in vector order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    /// True when no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl fmt::Debug for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.named()).finish()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.named() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Assembles the feature vector for a cleaned opcode sequence and its graph statistics.
///
/// Fails with [`Error::EmptyOpcodeSequence`] when `cleaned` is empty instead of returning a
/// zero-filled vector.
pub fn assemble(cleaned: &[String], graph: &GraphStats) -> Result<FeatureVector> {
    if cleaned.is_empty() {
        return Err(Error::EmptyOpcodeSequence);
    }

    let [
        arithmetic,
        bitwise,
        comparison,
        memory,
        storage,
        control,
        stack,
        system,
        block,
        environment,
    ] = OpcodeCategory::ALL.map(|category| category.ratio(cleaned));

    let num_nodes = graph.num_nodes as f64;
    let branches = cleaned
        .iter()
        .filter(|op| BRANCHING_OPCODES.contains(&op.as_str()))
        .count();
    let cyclomatic_complexity = branches as f64 + 1.0;
    // May go negative for dense, branchy code; left unclamped.
    let maintainability_index = 100.0 - cyclomatic_complexity * graph.density * 100.0;

    let vector = FeatureVector([
        num_nodes,
        graph.num_edges as f64,
        graph.max_in_degree as f64,
        graph.max_out_degree as f64,
        graph.avg_in_degree,
        graph.avg_out_degree,
        graph.density,
        graph.clustering_coefficient,
        arithmetic,
        bitwise,
        comparison,
        memory,
        storage,
        control,
        stack,
        system,
        block,
        environment,
        safe_div(control, stack),
        system,
        safe_div(storage, memory),
        graph.avg_in_degree,
        cyclomatic_complexity,
        (arithmetic + bitwise) * num_nodes,
        maintainability_index,
    ]);

    tracing::debug!(
        "Assembled feature vector over {} opcodes ({} distinct)",
        cleaned.len(),
        graph.num_nodes
    );
    Ok(vector)
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
