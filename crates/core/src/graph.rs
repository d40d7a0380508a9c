//! Sequence-adjacency graph over a cleaned opcode stream.
//!
//! Nodes are the distinct mnemonics of the stream, in order of first appearance. Every pair of
//! consecutive instructions contributes one directed edge, so repeated transitions show up as
//! parallel edges and count towards degrees. Jump targets are not followed: the graph
//! approximates control flow by linear instruction order only.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Degree and density statistics of a [`SequenceGraph`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of distinct mnemonics.
    pub num_nodes: usize,
    /// Number of consecutive-instruction transitions (`len - 1`).
    pub num_edges: usize,
    /// Largest number of transitions into a single mnemonic.
    pub max_in_degree: usize,
    /// Largest number of transitions out of a single mnemonic.
    pub max_out_degree: usize,
    /// Sum of in-degrees over `num_nodes`.
    pub avg_in_degree: f64,
    /// Sum of out-degrees over `num_nodes`.
    pub avg_out_degree: f64,
    /// Distinct edge sources over `num_nodes * (num_nodes - 1)`.
    ///
    /// The numerator counts mnemonics with at least one outgoing transition, not edges. This
    /// differs from textbook graph density and is kept as-is because trained models expect it.
    pub density: f64,
    /// Always zero; reserved slot in the feature layout.
    pub clustering_coefficient: f64,
}

/// Directed multigraph of mnemonic transitions.
#[derive(Clone, Debug, Default)]
pub struct SequenceGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

/// Builds the transition graph for a cleaned opcode sequence.
pub fn build_graph(cleaned: &[String]) -> SequenceGraph {
    let mut graph = DiGraph::with_capacity(0, cleaned.len().saturating_sub(1));
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    let nodes: Vec<NodeIndex> = cleaned
        .iter()
        .map(|mnemonic| {
            *index
                .entry(mnemonic.clone())
                .or_insert_with(|| graph.add_node(mnemonic.clone()))
        })
        .collect();

    for pair in nodes.windows(2) {
        graph.add_edge(pair[0], pair[1], ());
    }

    tracing::debug!(
        "Built sequence graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    SequenceGraph { graph, index }
}

impl SequenceGraph {
    /// Underlying petgraph multigraph; node weights are mnemonics.
    pub fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// Number of transitions out of `mnemonic` (0 if it never occurs).
    pub fn out_degree(&self, mnemonic: &str) -> usize {
        self.degree(mnemonic, Direction::Outgoing)
    }

    /// Number of transitions into `mnemonic` (0 if it never occurs).
    pub fn in_degree(&self, mnemonic: &str) -> usize {
        self.degree(mnemonic, Direction::Incoming)
    }

    fn degree(&self, mnemonic: &str, dir: Direction) -> usize {
        self.index
            .get(mnemonic)
            .map_or(0, |&n| self.graph.edges_directed(n, dir).count())
    }

    /// Successor multiset of every mnemonic that has one.
    ///
    /// Sources appear in first-appearance order; successors are listed in the order the
    /// transitions occur in the sequence, duplicates included.
    pub fn adjacency(&self) -> Vec<(&str, Vec<&str>)> {
        let mut successors: Vec<Vec<&str>> = vec![Vec::new(); self.graph.node_count()];
        for edge in self.graph.raw_edges() {
            successors[edge.source().index()].push(self.graph[edge.target()].as_str());
        }

        self.graph
            .node_indices()
            .zip(successors)
            .filter(|(_, next)| !next.is_empty())
            .map(|(n, next)| (self.graph[n].as_str(), next))
            .collect()
    }

    /// Computes degree and density statistics.
    pub fn stats(&self) -> GraphStats {
        let num_nodes = self.graph.node_count();
        let num_edges = self.graph.edge_count();

        let mut max_in_degree = 0;
        let mut max_out_degree = 0;
        let mut in_sum = 0;
        let mut out_sum = 0;
        let mut sources = 0;
        for n in self.graph.node_indices() {
            let in_deg = self.graph.edges_directed(n, Direction::Incoming).count();
            let out_deg = self.graph.edges_directed(n, Direction::Outgoing).count();
            max_in_degree = max_in_degree.max(in_deg);
            max_out_degree = max_out_degree.max(out_deg);
            in_sum += in_deg;
            out_sum += out_deg;
            if out_deg > 0 {
                sources += 1;
            }
        }

        let (avg_in_degree, avg_out_degree) = if num_nodes > 0 {
            (
                in_sum as f64 / num_nodes as f64,
                out_sum as f64 / num_nodes as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let density = if num_nodes > 1 {
            sources as f64 / (num_nodes * (num_nodes - 1)) as f64
        } else {
            0.0
        };

        GraphStats {
            num_nodes,
            num_edges,
            max_in_degree,
            max_out_degree,
            avg_in_degree,
            avg_out_degree,
            density,
            clustering_coefficient: 0.0,
        }
    }
}
