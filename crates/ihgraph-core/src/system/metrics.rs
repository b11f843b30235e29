//! # Graph Metrics
//!
//! Counts over a hierarchy, reported by `inspect` and after each
//! transformation. Metrics are informational only; no operation depends
//! on them.

use crate::graph::{IHGraph, Level};
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary of a hierarchy, taken from its root level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Direct children of the root.
    pub shallow_node_count: usize,
    /// All nodes below the root, nested levels included.
    pub deep_node_count: usize,
    /// Leaves at any depth.
    pub leaf_count: usize,
    /// Nested graph levels at any depth.
    pub nested_level_count: usize,
    /// Edge types declared on the root.
    pub edge_type_count: usize,
    /// Edge types declared on the root that are immediate.
    pub immediate_edge_type_count: usize,
    pub shallow_edge_count: usize,
    pub deep_edge_count: usize,
    /// Highest shallow edge priority, `None` without shallow edges.
    pub highest_priority: Option<i64>,
    /// Nesting depth: 0 for a flat graph.
    pub max_depth: usize,
}

impl GraphMetrics {
    /// Create new metrics with all zeros.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &IHGraph) -> Self {
        let top = graph.top();
        let deep_nodes = top.deep_nodes();
        let leaf_count = deep_nodes
            .iter()
            .filter(|&&id| graph.node(id).is_some_and(|node| node.is_leaf()))
            .count();
        let immediate_edge_type_count = top
            .edge_types()
            .iter()
            .filter(|&&id| graph.edge_type(id).is_some_and(|ty| ty.immediate))
            .count();

        Self {
            shallow_node_count: top.nodes().len(),
            deep_node_count: deep_nodes.len(),
            leaf_count,
            nested_level_count: deep_nodes.len().saturating_sub(leaf_count),
            edge_type_count: top.edge_types().len(),
            immediate_edge_type_count,
            shallow_edge_count: top.shallow_edges().len(),
            deep_edge_count: top.deep_edges().len(),
            highest_priority: graph.highest_priority(Scope::Shallow).ok(),
            max_depth: compute_max_depth(top),
        }
    }
}

/// Levels of nesting below `level`.
fn compute_max_depth(level: Level<'_>) -> usize {
    let graph = level.graph();
    level
        .graph_nodes()
        .into_iter()
        .filter_map(|id| graph.level(id))
        .map(|nested| compute_max_depth(nested).saturating_add(1))
        .max()
        .unwrap_or(0)
}

impl fmt::Display for GraphMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "nodes: {} shallow, {} deep ({} leaves, {} levels)",
            self.shallow_node_count, self.deep_node_count, self.leaf_count, self.nested_level_count
        )?;
        writeln!(
            f,
            "edge types: {} ({} immediate)",
            self.edge_type_count, self.immediate_edge_type_count
        )?;
        writeln!(
            f,
            "edges: {} shallow, {} deep",
            self.shallow_edge_count, self.deep_edge_count
        )?;
        match self.highest_priority {
            Some(priority) => writeln!(f, "highest priority: {}", priority)?,
            None => writeln!(f, "highest priority: none")?,
        }
        write!(f, "max depth: {}", self.max_depth)
    }
}
