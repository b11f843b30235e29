//! # Nodes
//!
//! Every element of a hierarchy is an `IHNode`: it has an identifier, a
//! parent level, incoming/outgoing edge back-references and annotations.
//! Its payload is either a leaf (source fragment plus status) or a nested
//! graph level (child nodes, edge types, processor configuration).

use crate::annotations::Annotations;
use crate::configuration::TransformationConfiguration;
use crate::types::{EdgeId, EdgeTypeId, NodeId, NodeStatus, Uid};

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload of a leaf node: a source fragment and its processing status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafNode {
    pub content: Option<String>,
    pub status: NodeStatus,
}

impl LeafNode {
    #[must_use]
    pub fn new(content: Option<String>) -> Self {
        Self {
            content,
            status: NodeStatus::default(),
        }
    }

    /// Content, or the empty string when none is set.
    #[must_use]
    pub fn content_as_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Append `text` to the content, creating it if absent.
    pub fn append_content(&mut self, text: &str) {
        self.content.get_or_insert_with(String::new).push_str(text);
    }

    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }
}

/// Payload of a nested graph level.
///
/// `nodes` and `edge_types` are kept in insertion order; that order is the
/// iteration order of every query on the level.
#[derive(Debug, Clone, Default)]
pub struct GraphLevel {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) edge_types: Vec<EdgeTypeId>,
    pub configuration: TransformationConfiguration,
}

impl GraphLevel {
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn edge_types(&self) -> &[EdgeTypeId] {
        &self.edge_types
    }
}

/// Leaf or nested level.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(LeafNode),
    Graph(GraphLevel),
}

// =============================================================================
// NODE
// =============================================================================

/// A node of the hierarchy.
#[derive(Debug, Clone)]
pub struct IHNode {
    pub identifier: String,
    pub annotations: Annotations,
    pub(crate) parent: Option<NodeId>,
    pub(crate) incoming: Vec<EdgeId>,
    pub(crate) outgoing: Vec<EdgeId>,
    pub(crate) uid: Uid,
    pub(crate) kind: NodeKind,
}

impl IHNode {
    pub(crate) fn new(identifier: String, kind: NodeKind, uid: Uid) -> Self {
        Self {
            identifier,
            annotations: Annotations::new(),
            parent: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            uid,
            kind,
        }
    }

    /// Level this node currently belongs to. `None` for the root and for
    /// nodes that have been unlinked from their level.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    #[must_use]
    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn is_graph(&self) -> bool {
        matches!(self.kind, NodeKind::Graph(_))
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Graph(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Graph(_) => None,
        }
    }

    #[must_use]
    pub fn as_level(&self) -> Option<&GraphLevel> {
        match &self.kind {
            NodeKind::Graph(level) => Some(level),
            NodeKind::Leaf(_) => None,
        }
    }

    pub(crate) fn as_level_mut(&mut self) -> Option<&mut GraphLevel> {
        match &mut self.kind {
            NodeKind::Graph(level) => Some(level),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Processor configuration of a nested level.
    pub fn configuration_mut(&mut self) -> Option<&mut TransformationConfiguration> {
        self.as_level_mut().map(|level| &mut level.configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_content_creates_and_extends() {
        let mut leaf = LeafNode::default();
        assert_eq!(leaf.content_as_str(), "");

        leaf.append_content("var x = 1;");
        leaf.append_content(" x + 2");
        assert_eq!(leaf.content_as_str(), "var x = 1; x + 2");
    }

    #[test]
    fn status_defaults_to_undefined() {
        let mut leaf = LeafNode::new(Some("sum(3)".to_string()));
        assert_eq!(leaf.status, NodeStatus::Undefined);
        leaf.set_status(NodeStatus::Success);
        assert_eq!(leaf.status, NodeStatus::Success);
    }

    #[test]
    fn kind_accessors() {
        let mut leaf = IHNode::new("a".to_string(), NodeKind::Leaf(LeafNode::default()), Uid(1));
        assert!(leaf.is_leaf());
        assert!(leaf.as_level().is_none());
        assert!(leaf.configuration_mut().is_none());

        let mut level = IHNode::new(
            "g".to_string(),
            NodeKind::Graph(GraphLevel::default()),
            Uid(2),
        );
        assert!(level.is_graph());
        assert!(level.as_leaf_mut().is_none());
        assert!(level.configuration_mut().is_some());
    }
}
