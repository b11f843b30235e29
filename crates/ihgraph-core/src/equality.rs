//! # Structural Equality
//!
//! Two graphs are structurally equal when they hold the same elements by
//! identifier: same deep node count and identifiers, same own edge types,
//! same deep edge count, and every edge of one has an edge with the same
//! identifier triple in the other. Handles, uids, contents and annotations
//! are not compared.

use crate::edge::EdgeTriple;
use crate::graph::IHGraph;
use std::collections::BTreeSet;

impl IHGraph {
    /// `true` when `self` and `other` are structurally equal.
    #[must_use]
    pub fn structurally_equals(&self, other: &IHGraph) -> bool {
        self.structural_differences(other).is_empty()
    }

    /// Human-readable reasons why `self` and `other` differ; empty when
    /// they are structurally equal.
    #[must_use]
    pub fn structural_differences(&self, other: &IHGraph) -> Vec<String> {
        let (a, b) = (self.top(), other.top());
        let mut differences = Vec::new();

        let a_nodes = a.deep_nodes();
        let b_nodes = b.deep_nodes();
        if a_nodes.len() != b_nodes.len() {
            differences.push(format!(
                "node count {} != {}",
                a_nodes.len(),
                b_nodes.len()
            ));
        }
        if a.edge_types().len() != b.edge_types().len() {
            differences.push(format!(
                "edge type count {} != {}",
                a.edge_types().len(),
                b.edge_types().len()
            ));
        }
        let a_edges = a.deep_edges();
        let b_edges = b.deep_edges();
        if a_edges.len() != b_edges.len() {
            differences.push(format!(
                "edge count {} != {}",
                a_edges.len(),
                b_edges.len()
            ));
        }

        let a_ids: BTreeSet<&str> = a_nodes.iter().map(|&n| self.identifier_of(n)).collect();
        let b_ids: BTreeSet<&str> = b_nodes.iter().map(|&n| other.identifier_of(n)).collect();
        for missing in a_ids.difference(&b_ids) {
            differences.push(format!("node {} missing on the right", missing));
        }
        for missing in b_ids.difference(&a_ids) {
            differences.push(format!("node {} missing on the left", missing));
        }

        let a_types: BTreeSet<&str> = a.edge_type_identifiers().into_iter().collect();
        let b_types: BTreeSet<&str> = b.edge_type_identifiers().into_iter().collect();
        for missing in a_types.difference(&b_types) {
            differences.push(format!("edge type {} missing on the right", missing));
        }
        for missing in b_types.difference(&a_types) {
            differences.push(format!("edge type {} missing on the left", missing));
        }

        let b_triples: BTreeSet<EdgeTriple> = b_edges
            .iter()
            .filter_map(|&e| other.edge_triple(e))
            .collect();
        for triple in a_edges.iter().filter_map(|&e| self.edge_triple(e)) {
            if !b_triples.contains(&triple) {
                differences.push(format!("edge {} missing on the right", triple));
            }
        }
        differences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeType;

    fn pair(source: &str, target: &str, ty: &str) -> IHGraph {
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf(source);
        let b = graph.create_leaf(target);
        let t = graph.create_edge_type(EdgeType::new(ty, 0));
        graph.create_edge(a, b, t).expect("edge");
        graph
    }

    #[test]
    fn equal_graphs_have_no_differences() {
        let left = pair("a", "b", "T");
        let right = pair("a", "b", "T");
        assert!(left.structurally_equals(&right));
        assert!(right.structurally_equals(&left));
    }

    #[test]
    fn reversed_edge_is_a_difference() {
        let left = pair("a", "b", "T");
        let right = pair("b", "a", "T");
        let differences = left.structural_differences(&right);
        assert_eq!(differences, vec!["edge a -T-> b missing on the right".to_string()]);
    }

    #[test]
    fn renamed_type_is_a_difference() {
        let left = pair("a", "b", "T");
        let right = pair("a", "b", "U");
        assert!(!left.structurally_equals(&right));
    }

    #[test]
    fn contents_are_ignored() {
        let left = pair("a", "b", "T");
        let mut right = pair("a", "b", "T");
        let a = right.top().nodes()[0];
        right.leaf_mut(a).expect("leaf").append_content("changed");
        assert!(left.structurally_equals(&right));
    }

    #[test]
    fn extra_node_changes_count() {
        let left = pair("a", "b", "T");
        let mut right = pair("a", "b", "T");
        right.create_leaf("c");
        let differences = left.structural_differences(&right);
        assert!(differences.iter().any(|d| d.starts_with("node count")));
        assert!(differences.iter().any(|d| d == "node c missing on the left"));
    }

    #[test]
    fn duplicate_identifiers_compare_as_a_set() {
        // a, a, b against a, b, b: same counts and same identifier sets.
        let mut left = pair("a", "b", "T");
        left.create_leaf("a");
        let mut right = pair("a", "b", "T");
        right.create_leaf("b");
        assert!(left.structurally_equals(&right));
    }

    #[test]
    fn edge_multiplicity_is_not_compared() {
        let mut left = IHGraph::new("g");
        let a = left.create_leaf("a");
        let b = left.create_leaf("b");
        let t = left.create_edge_type(EdgeType::new("T", 0));
        left.create_edge(a, b, t).expect("edge");
        left.create_edge(a, b, t).expect("edge");

        let mut right = IHGraph::new("g");
        let a = right.create_leaf("a");
        let b = right.create_leaf("b");
        let c = right.create_leaf("b");
        let t = right.create_edge_type(EdgeType::new("T", 0));
        right.create_edge(a, b, t).expect("edge");
        right.create_edge(a, c, t).expect("edge");

        // Node counts differ, edges match by triple.
        let differences = left.structural_differences(&right);
        assert_eq!(differences, vec!["node count 2 != 3".to_string()]);
    }
}
