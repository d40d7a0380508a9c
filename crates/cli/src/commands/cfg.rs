//! Builds the opcode sequence graph of the input and renders it as Graphviz .dot, either to a
//! file or to stdout. Edge labels carry how often each transition occurs.

use async_trait::async_trait;
use cerberus_core::decoder::decode_bytecode;
use cerberus_core::{SequenceGraph, build_graph, normalize};
use clap::Args;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;

/// Arguments for the `cfg` subcommand.
#[derive(Args)]
pub struct CfgArgs {
    /// Input bytecode as a hex string (0x...) or file path containing EVM bytecode.
    pub input: String,
    /// Output file for Graphviz .dot (default: stdout)
    #[arg(short, long)]
    output: Option<String>,
}

/// Executes the `cfg` subcommand to generate the graph visualization.
#[async_trait]
impl super::Command for CfgArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let is_file = super::is_file_input(&self.input);
        let (instructions, _, _, _) = decode_bytecode(&self.input, is_file).await?;
        let cleaned = normalize(&instructions);
        let graph = build_graph(&cleaned);

        let dot = generate_dot(&graph);
        if let Some(out_path) = self.output {
            fs::write(out_path, &dot)?;
        } else {
            println!("{dot}");
        }
        Ok(())
    }
}

/// Generates a Graphviz .dot representation of the sequence graph.
///
/// Parallel edges are collapsed into one edge labelled with their multiplicity.
pub fn generate_dot(graph: &SequenceGraph) -> String {
    let g = graph.graph();
    let mut dot = String::from("digraph Opcodes {\n");

    for node in g.node_indices() {
        dot.push_str(&format!("    {} [label=\"{}\"];\n", node.index(), g[node]));
    }

    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for edge in g.raw_edges() {
        *counts
            .entry((edge.source().index(), edge.target().index()))
            .or_default() += 1;
    }
    for ((src, dst), count) in counts {
        dot.push_str(&format!("    {src} -> {dst} [label=\"{count}\"];\n"));
    }

    dot.push_str("}\n");
    dot
}
