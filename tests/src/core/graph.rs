use cerberus_core::{GraphStats, build_graph};

fn seq(ops: &[&str]) -> Vec<String> {
    ops.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_worked_example_statistics() {
    let graph = build_graph(&seq(&["PUSH", "PUSH", "ADD", "SSTORE", "JUMPI"]));
    let stats = graph.stats();

    assert_eq!(stats.num_nodes, 4);
    assert_eq!(stats.num_edges, 4);
    assert_eq!(graph.out_degree("PUSH"), 2);
    assert_eq!(graph.in_degree("PUSH"), 1);
    assert_eq!(stats.max_out_degree, 2);
    assert_eq!(stats.avg_out_degree, 1.0);
    // Sources are PUSH, ADD and SSTORE: 3 / (4 * 3)
    assert!((stats.density - 0.25).abs() < 1e-12);
}

#[test]
fn test_edge_count_is_sequence_length_minus_one() {
    for len in [1usize, 2, 7, 40] {
        let ops: Vec<String> = (0..len)
            .map(|i| ["PUSH", "MSTORE", "CALL", "SLOAD"][i % 4].to_string())
            .collect();
        assert_eq!(build_graph(&ops).stats().num_edges, len - 1, "len {len}");
    }
}

#[test]
fn test_adjacency_preserves_repeats() {
    let graph = build_graph(&seq(&["PUSH", "ADD", "PUSH", "ADD", "STOP"]));
    let adjacency = graph.adjacency();
    let push = adjacency.iter().find(|(op, _)| *op == "PUSH").unwrap();
    assert_eq!(push.1, ["ADD", "ADD"]);
    let add = adjacency.iter().find(|(op, _)| *op == "ADD").unwrap();
    assert_eq!(add.1, ["PUSH", "STOP"]);
}

#[test]
fn test_single_node_has_zero_density() {
    let stats = build_graph(&seq(&["STOP"])).stats();
    assert_eq!(stats.num_nodes, 1);
    assert_eq!(stats.density, 0.0);
    assert!(stats.avg_in_degree.is_finite());
}

#[test]
fn test_empty_sequence_gives_default_stats() {
    assert_eq!(build_graph(&[]).stats(), GraphStats::default());
}
