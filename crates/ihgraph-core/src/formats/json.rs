//! # Factory JSON Format
//!
//! ```text
//! { "nodes":     [{ "identifier", "content"?, "status"?, "annotations"? }],
//!   "edgeTypes": [{ "identifier", "priority"?, "immediate"?, "direction"?, "annotations"? }],
//!   "edges":     [{ "edgeType", "sourceNode", "targetNode", "annotations"? }],
//!   "annotations"? }
//! ```
//!
//! `identifier` also accepts `id` and `name`. Edges reference nodes and edge
//! types by identifier, first match.
//!
//! Only the root level is exported. Nested levels, and the edges incident on
//! them, are skipped with a warning; flatten a graph before exporting it.

use crate::annotations::Annotations;
use crate::edge::EdgeType;
use crate::graph::IHGraph;
use crate::primitives::SYNTHETIC_ID_PREFIX;
use crate::types::{IHGraphError, NodeId, NodeStatus, TransformationDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum accepted size of a factory document.
///
/// Checked before parsing so oversized input is rejected without allocating
/// the graph.
pub const MAX_FACTORY_INPUT_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// RECORDS
// =============================================================================

/// Serializable form of a flat graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edge_types: Vec<EdgeTypeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(default, alias = "id", alias = "name")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTypeRecord {
    #[serde(default, alias = "id", alias = "name")]
    pub identifier: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub immediate: bool,
    #[serde(default)]
    pub direction: TransformationDirection,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub edge_type: String,
    pub source_node: String,
    pub target_node: String,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl GraphRecord {
    /// Record of the root level of `graph`.
    ///
    /// Unnamed leaves get a synthesized identifier (`id0`, `id1`, ...),
    /// numbered per call.
    #[must_use]
    pub fn from_graph(graph: &IHGraph, include_annotations: bool) -> Self {
        let top = graph.top();
        let pick = |annotations: &Annotations| {
            if include_annotations {
                annotations.clone()
            } else {
                Annotations::new()
            }
        };

        let mut names: BTreeMap<NodeId, String> = BTreeMap::new();
        let mut synthetic = 0usize;
        let mut nodes = Vec::new();
        for &id in top.nodes() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let Some(leaf) = node.as_leaf() else {
                warn!(level = %node.identifier, "nested level is not serialized");
                continue;
            };
            let name = if node.identifier.is_empty() {
                let name = format!("{}{}", SYNTHETIC_ID_PREFIX, synthetic);
                synthetic += 1;
                name
            } else {
                node.identifier.clone()
            };
            nodes.push(NodeRecord {
                identifier: name.clone(),
                content: leaf.content.clone(),
                status: (leaf.status != NodeStatus::Undefined).then_some(leaf.status),
                annotations: pick(&node.annotations),
            });
            names.insert(id, name);
        }

        let edge_types = top
            .edge_types()
            .iter()
            .filter_map(|&id| graph.edge_type(id))
            .map(|ty| EdgeTypeRecord {
                identifier: ty.identifier.clone(),
                priority: ty.priority,
                immediate: ty.immediate,
                direction: ty.direction,
                annotations: pick(&ty.annotations),
            })
            .collect();

        let mut edges = Vec::new();
        for edge_id in top.shallow_edges() {
            let Some(edge) = graph.edge(edge_id) else {
                continue;
            };
            let (Some(source), Some(target), Some(ty)) = (
                names.get(&edge.source()),
                names.get(&edge.target()),
                graph.edge_type(edge.edge_type()),
            ) else {
                continue;
            };
            edges.push(EdgeRecord {
                edge_type: ty.identifier.clone(),
                source_node: source.clone(),
                target_node: target.clone(),
                annotations: pick(&edge.annotations),
            });
        }

        let identifier = Some(graph.identifier().to_string()).filter(|id| !id.is_empty());
        let annotations = graph
            .node(graph.root())
            .map(|root| pick(&root.annotations))
            .unwrap_or_default();

        Self {
            identifier,
            nodes,
            edge_types,
            edges,
            annotations,
        }
    }
}

impl TryFrom<GraphRecord> for IHGraph {
    type Error = IHGraphError;

    fn try_from(record: GraphRecord) -> Result<Self, Self::Error> {
        let mut graph = IHGraph::new(record.identifier.unwrap_or_default());
        let root = graph.root();
        if let Some(node) = graph.node_mut(root) {
            node.annotations = record.annotations;
        }

        for node in record.nodes {
            let id = graph.create_leaf(node.identifier);
            if let Some(created) = graph.node_mut(id) {
                created.annotations = node.annotations;
            }
            if let Some(leaf) = graph.leaf_mut(id) {
                leaf.content = node.content;
                leaf.status = node.status.unwrap_or_default();
            }
        }

        for ty in record.edge_types {
            let mut edge_type = EdgeType::new(ty.identifier, ty.priority)
                .with_immediate(ty.immediate)
                .with_direction(ty.direction);
            edge_type.annotations = ty.annotations;
            graph.create_edge_type(edge_type);
        }

        for edge in record.edges {
            let top = graph.top();
            let source = top.find_shallow_node(&edge.source_node).ok_or_else(|| {
                IHGraphError::MalformedInput(format!(
                    "source node with identifier '{}' does not exist",
                    edge.source_node
                ))
            })?;
            let target = top.find_shallow_node(&edge.target_node).ok_or_else(|| {
                IHGraphError::MalformedInput(format!(
                    "target node with identifier '{}' does not exist",
                    edge.target_node
                ))
            })?;
            let edge_type = top.find_own_edge_type(&edge.edge_type).ok_or_else(|| {
                IHGraphError::MalformedInput(format!(
                    "edge type with identifier '{}' does not exist",
                    edge.edge_type
                ))
            })?;
            let id = graph.create_edge(source, target, edge_type)?;
            if let Some(created) = graph.edge_mut(id) {
                created.annotations = edge.annotations;
            }
        }
        Ok(graph)
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize the root level of `graph` as pretty-printed factory JSON.
pub fn graph_to_json(graph: &IHGraph, include_annotations: bool) -> Result<String, IHGraphError> {
    let record = GraphRecord::from_graph(graph, include_annotations);
    Ok(serde_json::to_string_pretty(&record)?)
}

/// Build a graph from factory JSON.
pub fn graph_from_json(json: &str) -> Result<IHGraph, IHGraphError> {
    if json.len() > MAX_FACTORY_INPUT_SIZE {
        return Err(IHGraphError::SerializationError(format!(
            "Input size {} bytes exceeds maximum allowed {} bytes",
            json.len(),
            MAX_FACTORY_INPUT_SIZE
        )));
    }
    let record: GraphRecord = serde_json::from_str(json)?;
    IHGraph::try_from(record)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SEQUENCE: &str = r#"{
        "nodes": [{ "name": "Defines" }, { "name": "Setup" }, { "name": "Loop" }],
        "edgeTypes": [{ "name": "Sequence", "priority": 1 }],
        "edges": [
            { "edgeType": "Sequence", "sourceNode": "Defines", "targetNode": "Setup" },
            { "edgeType": "Sequence", "sourceNode": "Setup", "targetNode": "Loop" }
        ]
    }"#;

    #[test]
    fn factory_accepts_name_alias() {
        let graph = graph_from_json(SEQUENCE).expect("parse");
        assert_eq!(graph.top().node_identifiers(), vec!["Defines", "Setup", "Loop"]);
        assert_eq!(graph.top().shallow_edges().len(), 2);
        let ty = graph.edge_type(graph.top().edge_types()[0]).expect("type");
        assert_eq!(ty.priority, 1);
        assert!(!ty.immediate);
    }

    #[test]
    fn round_trip_is_structurally_equal() {
        let graph = graph_from_json(SEQUENCE).expect("parse");
        let json = graph_to_json(&graph, true).expect("serialize");
        let back = graph_from_json(&json).expect("reparse");
        assert!(back.structurally_equals(&graph));
    }

    #[test]
    fn unknown_source_is_malformed() {
        let json = r#"{
            "nodes": [{ "id": "a" }],
            "edgeTypes": [{ "id": "T" }],
            "edges": [{ "edgeType": "T", "sourceNode": "ghost", "targetNode": "a" }]
        }"#;
        let err = graph_from_json(json).err().expect("must fail");
        assert_eq!(
            err.to_string(),
            "malformed input: source node with identifier 'ghost' does not exist"
        );
    }

    #[test]
    fn unknown_edge_type_is_malformed() {
        let json = r#"{
            "nodes": [{ "id": "a" }, { "id": "b" }],
            "edges": [{ "edgeType": "T", "sourceNode": "a", "targetNode": "b" }]
        }"#;
        assert!(matches!(
            graph_from_json(json),
            Err(IHGraphError::MalformedInput(_))
        ));
    }

    #[test]
    fn syntax_error_is_serialization_error() {
        assert!(matches!(
            graph_from_json("{ nodes: "),
            Err(IHGraphError::SerializationError(_))
        ));
    }

    #[test]
    fn unnamed_nodes_get_synthetic_identifiers() {
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("");
        let b = graph.create_leaf("");
        let ty = graph.create_edge_type(EdgeType::new("T", 0));
        graph.create_edge(a, b, ty).expect("edge");

        let record = GraphRecord::from_graph(&graph, false);
        let names: Vec<&str> = record.nodes.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(names, vec!["id0", "id1"]);
        assert_eq!(record.edges[0].source_node, "id0");
        assert_eq!(record.edges[0].target_node, "id1");
    }

    #[test]
    fn annotations_are_optional_in_output() {
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("a");
        graph
            .node_mut(a)
            .expect("a")
            .annotations
            .set_str("k", "v");

        let without = GraphRecord::from_graph(&graph, false);
        assert!(without.nodes[0].annotations.is_empty());
        let with = GraphRecord::from_graph(&graph, true);
        assert_eq!(with.nodes[0].annotations.get_str("k"), Some("v"));
    }

    #[test]
    fn content_status_and_direction_survive() {
        let json = r#"{
            "nodes": [{ "id": "Define", "content": "var x = 1;", "status": "success" }],
            "edgeTypes": [{ "id": "Dep", "priority": 3, "immediate": true, "direction": "dependency" }]
        }"#;
        let graph = graph_from_json(json).expect("parse");
        let node = graph.node(graph.top().nodes()[0]).expect("node");
        let leaf = node.as_leaf().expect("leaf");
        assert_eq!(leaf.content_as_str(), "var x = 1;");
        assert_eq!(leaf.status, NodeStatus::Success);
        let ty = graph.edge_type(graph.top().edge_types()[0]).expect("type");
        assert_eq!(ty.direction, TransformationDirection::Dependency);
        assert!(ty.immediate);

        let record = GraphRecord::from_graph(&graph, false);
        assert_eq!(record.nodes[0].status, Some(NodeStatus::Success));
        assert_eq!(record.edge_types[0].priority, 3);
    }

    #[test]
    fn nested_levels_are_skipped() {
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("a");
        let nested = graph.create_level("n");
        let ty = graph.create_edge_type(EdgeType::new("T", 0));
        graph.create_edge(a, nested, ty).expect("edge");

        let record = GraphRecord::from_graph(&graph, false);
        assert_eq!(record.nodes.len(), 1);
        assert!(record.edges.is_empty());
        assert_eq!(record.edge_types.len(), 1);
    }
}
