//! # Property-Based Tests
//!
//! Invariants of the rewriting algebra over random chain graphs
//! `n0 -T?-> n1 -T?-> n2 ...` and over random multigraphs with branching,
//! cycles, self-loops and parallel edges. Edge types are drawn from a small
//! pool of distinct priorities.

use ihgraph_core::{EdgeType, IHGraph, graph_from_json, graph_to_json};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// (identifier, priority, immediate)
const TYPE_POOL: [(&str, i64, bool); 4] = [
    ("Sequence", 8, false),
    ("Execute", 2, false),
    ("Test", 0, true),
    ("Emit", 5, false),
];

fn chain(links: &[usize]) -> IHGraph {
    let mut graph = IHGraph::new("chain");
    let types: Vec<_> = TYPE_POOL
        .iter()
        .map(|&(id, priority, immediate)| {
            graph.create_edge_type(EdgeType::new(id, priority).with_immediate(immediate))
        })
        .collect();

    let mut previous = graph.create_leaf("n0");
    for (i, &link) in links.iter().enumerate() {
        let next = graph.create_leaf(format!("n{}", i + 1));
        graph
            .create_edge(previous, next, types[link % types.len()])
            .expect("edge");
        previous = next;
    }
    graph
}

/// Chain without the edge types none of its links use.
fn used_chain(links: &[usize]) -> IHGraph {
    chain(links).deep_clone().expect("clone")
}

/// `node_count` leaves `n0..` joined by `(source, target, type)` edges.
/// Indices are taken modulo the node and type counts.
fn multigraph(node_count: usize, edges: &[(usize, usize, usize)]) -> IHGraph {
    let mut graph = IHGraph::new("multigraph");
    let types: Vec<_> = TYPE_POOL
        .iter()
        .map(|&(id, priority, immediate)| {
            graph.create_edge_type(EdgeType::new(id, priority).with_immediate(immediate))
        })
        .collect();
    let nodes: Vec<_> = (0..node_count)
        .map(|i| graph.create_leaf(format!("n{}", i)))
        .collect();
    for &(source, target, ty) in edges {
        graph
            .create_edge(
                nodes[source % nodes.len()],
                nodes[target % nodes.len()],
                types[ty % types.len()],
            )
            .expect("edge");
    }
    graph.deep_clone().expect("clone")
}

/// Node count and edge list of a random multigraph.
fn multigraph_shape() -> impl Strategy<Value = (usize, Vec<(usize, usize, usize)>)> {
    (1usize..8).prop_flat_map(|n| (Just(n), vec((0..n, 0..n, 0usize..4), 0..16)))
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Flattening an induced hierarchy gives back the original graph.
    #[test]
    fn flatten_inverts_induce(links in vec(0usize..4, 1..12)) {
        let graph = used_chain(&links);
        let induced = graph.induce().expect("induce");
        let flat = induced.flatten().expect("flatten");

        prop_assert!(flat.top().graph_nodes().is_empty());
        prop_assert!(
            flat.structurally_equals(&graph),
            "{:?}",
            flat.structural_differences(&graph)
        );
    }

    /// Induction leaves at most one edge type on the root level and keeps
    /// every leaf somewhere in the hierarchy.
    #[test]
    fn induce_reaches_fixed_point(links in vec(0usize..4, 1..12)) {
        let graph = used_chain(&links);
        let induced = graph.induce().expect("induce");

        prop_assert!(induced.top().shallow_edge_type_keys().len() < 2);
        prop_assert_eq!(induced.top().deep_leaf_nodes().len(), links.len() + 1);

        let leaves: BTreeSet<String> = induced
            .top()
            .deep_leaf_nodes()
            .into_iter()
            .filter_map(|id| induced.node(id))
            .map(|node| node.identifier.clone())
            .collect();
        let expected: BTreeSet<String> = (0..=links.len()).map(|i| format!("n{}", i)).collect();
        prop_assert_eq!(leaves, expected);
    }

    /// Induction is deterministic.
    #[test]
    fn induce_is_deterministic(links in vec(0usize..4, 1..12)) {
        let graph = used_chain(&links);
        let first = graph.induce().expect("induce");
        let second = graph.induce().expect("induce");
        prop_assert!(first.structurally_equals(&second));
        prop_assert_eq!(
            first.top().node_identifiers(),
            second.top().node_identifiers()
        );
    }

    /// A deep clone is structurally equal to its source.
    #[test]
    fn clone_is_equal(links in vec(0usize..4, 1..12)) {
        let graph = used_chain(&links);
        let copy = graph.deep_clone().expect("clone");
        prop_assert!(copy.structurally_equals(&graph));
        prop_assert!(graph.structurally_equals(&copy));
    }

    /// The factory format preserves flat graphs.
    #[test]
    fn json_preserves_flat_graphs(links in vec(0usize..4, 1..12)) {
        let graph = chain(&links);
        let json = graph_to_json(&graph, true).expect("export");
        let back = graph_from_json(&json).expect("import");
        prop_assert!(back.structurally_equals(&graph));
    }

    /// Flattening an induced multigraph gives back the original graph.
    #[test]
    fn flatten_inverts_induce_on_multigraphs((n, edges) in multigraph_shape()) {
        let graph = multigraph(n, &edges);
        let induced = graph.induce().expect("induce");
        let flat = induced.flatten().expect("flatten");

        prop_assert!(flat.top().graph_nodes().is_empty());
        prop_assert!(
            flat.structurally_equals(&graph),
            "{:?}",
            flat.structural_differences(&graph)
        );
    }

    /// Induction of a multigraph keeps every leaf and every edge.
    #[test]
    fn induce_keeps_multigraph_elements((n, edges) in multigraph_shape()) {
        let graph = multigraph(n, &edges);
        let induced = graph.induce().expect("induce");

        prop_assert!(induced.top().shallow_edge_type_keys().len() < 2);
        prop_assert_eq!(induced.top().deep_leaf_nodes().len(), n);
        prop_assert_eq!(induced.top().deep_edges().len(), edges.len());
    }

    /// Clones and the factory format preserve multigraphs.
    #[test]
    fn multigraph_copies_are_equal((n, edges) in multigraph_shape()) {
        let graph = multigraph(n, &edges);
        let copy = graph.deep_clone().expect("clone");
        prop_assert!(copy.structurally_equals(&graph));

        let json = graph_to_json(&graph, true).expect("export");
        let back = graph_from_json(&json).expect("import");
        prop_assert!(back.structurally_equals(&graph));
    }
}
