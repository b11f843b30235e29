//! # Graph Engine
//!
//! Arena-backed storage for one hierarchical transformation graph.
//!
//! An `IHGraph` owns every node, edge and edge type of its hierarchy in three
//! slot vectors. The root is a node of kind `Graph`; nested levels are nodes
//! of the same kind listed by their parent. Back-references (`parent`,
//! `incoming`, `outgoing`, edge endpoints) are handles into the same arena.
//!
//! Slots are never reused. Removing an element empties its slot, so stale
//! handles resolve to `None`.

use crate::annotations::Annotations;
use crate::configuration::TransformationConfiguration;
use crate::edge::{EdgeTriple, EdgeType, EdgeTypeKey, TransformationEdge};
use crate::node::{GraphLevel, IHNode, LeafNode, NodeKind};
use crate::types::{EdgeId, EdgeTypeId, ElementKind, IHGraphError, NodeId, UidAllocator};
use std::collections::BTreeSet;

// =============================================================================
// GRAPH
// =============================================================================

/// A hierarchical transformation graph.
#[derive(Debug)]
pub struct IHGraph {
    pub(crate) nodes: Vec<Option<IHNode>>,
    pub(crate) edges: Vec<Option<TransformationEdge>>,
    pub(crate) edge_types: Vec<Option<EdgeType>>,
    pub(crate) root: NodeId,
    pub(crate) uids: UidAllocator,
}

impl IHGraph {
    /// Create an empty graph whose root level is named `identifier`.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_uid_allocator(identifier, UidAllocator::default())
    }

    /// Create an empty graph drawing debug uids from `uids`.
    #[must_use]
    pub fn with_uid_allocator(identifier: impl Into<String>, mut uids: UidAllocator) -> Self {
        let root = IHNode::new(
            identifier.into(),
            NodeKind::Graph(GraphLevel::default()),
            uids.allocate(),
        );
        Self {
            nodes: vec![Some(root)],
            edges: Vec::new(),
            edge_types: Vec::new(),
            root: NodeId(0),
            uids,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Handle of the root level.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Identifier of the root level.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.node(self.root)
            .map(|node| node.identifier.as_str())
            .unwrap_or_default()
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        let root = self.root;
        if let Some(node) = self.node_mut(root) {
            node.identifier = identifier.into();
        }
    }

    /// Debug uid allocator of this graph.
    #[must_use]
    pub fn uid_allocator(&self) -> &UidAllocator {
        &self.uids
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&IHNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut IHNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Leaf payload of `id`, if it is a live leaf.
    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut LeafNode> {
        self.node_mut(id).and_then(IHNode::as_leaf_mut)
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&TransformationEdge> {
        self.edges.get(id.index()).and_then(Option::as_ref)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut TransformationEdge> {
        self.edges.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn edge_type(&self, id: EdgeTypeId) -> Option<&EdgeType> {
        self.edge_types.get(id.index()).and_then(Option::as_ref)
    }

    pub fn edge_type_mut(&mut self, id: EdgeTypeId) -> Option<&mut EdgeType> {
        self.edge_types.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Read-only view of the root level.
    #[must_use]
    pub fn top(&self) -> Level<'_> {
        Level {
            graph: self,
            id: self.root,
        }
    }

    /// Read-only view of the level `id`, if it is a live graph node.
    #[must_use]
    pub fn level(&self, id: NodeId) -> Option<Level<'_>> {
        self.node(id)
            .filter(|node| node.is_graph())
            .map(|_| Level { graph: self, id })
    }

    /// Processor configuration of the level `id`.
    pub fn configuration_mut(&mut self, id: NodeId) -> Option<&mut TransformationConfiguration> {
        self.node_mut(id).and_then(IHNode::configuration_mut)
    }

    /// Identifier triple of an edge. Endpoints that were unlinked from their
    /// level still resolve.
    #[must_use]
    pub fn edge_triple(&self, id: EdgeId) -> Option<EdgeTriple> {
        let edge = self.edge(id)?;
        Some(EdgeTriple {
            source: self.node(edge.source)?.identifier.clone(),
            target: self.node(edge.target)?.identifier.clone(),
            edge_type: self.edge_type(edge.edge_type)?.identifier.clone(),
        })
    }

    /// Identifier of `node`, or the empty string for a stale handle.
    pub(crate) fn identifier_of(&self, node: NodeId) -> &str {
        self.node(node)
            .map(|n| n.identifier.as_str())
            .unwrap_or_default()
    }

    /// Level that owns `node`: its parent, or the root for the root itself.
    pub(crate) fn owning_level(&self, node: NodeId) -> Result<NodeId, IHGraphError> {
        if node == self.root {
            return Ok(self.root);
        }
        self.node(node)
            .and_then(IHNode::parent)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Node, node.index()))
    }

    pub(crate) fn level_data(&self, id: NodeId) -> Option<&GraphLevel> {
        self.node(id).and_then(IHNode::as_level)
    }

    fn level_data_mut(&mut self, id: NodeId) -> Option<&mut GraphLevel> {
        self.node_mut(id).and_then(IHNode::as_level_mut)
    }

    pub(crate) fn require_level(&self, id: NodeId) -> Result<(), IHGraphError> {
        match self.level_data(id) {
            Some(_) => Ok(()),
            None => Err(IHGraphError::stale(ElementKind::Level, id.index())),
        }
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Add a leaf to the root level.
    pub fn create_leaf(&mut self, identifier: impl Into<String>) -> NodeId {
        let root = self.root;
        self.insert_node(
            root,
            identifier.into(),
            NodeKind::Leaf(LeafNode::default()),
            Annotations::new(),
        )
    }

    /// Add a leaf to the level `level`.
    pub fn create_leaf_in(
        &mut self,
        level: NodeId,
        identifier: impl Into<String>,
    ) -> Result<NodeId, IHGraphError> {
        self.require_level(level)?;
        Ok(self.insert_node(
            level,
            identifier.into(),
            NodeKind::Leaf(LeafNode::default()),
            Annotations::new(),
        ))
    }

    /// Add an empty nested level to the root level.
    pub fn create_level(&mut self, identifier: impl Into<String>) -> NodeId {
        let root = self.root;
        self.insert_node(
            root,
            identifier.into(),
            NodeKind::Graph(GraphLevel::default()),
            Annotations::new(),
        )
    }

    /// Add an empty nested level to the level `level`.
    pub fn create_level_in(
        &mut self,
        level: NodeId,
        identifier: impl Into<String>,
    ) -> Result<NodeId, IHGraphError> {
        self.require_level(level)?;
        Ok(self.insert_node(
            level,
            identifier.into(),
            NodeKind::Graph(GraphLevel::default()),
            Annotations::new(),
        ))
    }

    /// Add an edge type to the root level.
    pub fn create_edge_type(&mut self, edge_type: EdgeType) -> EdgeTypeId {
        let root = self.root;
        self.insert_edge_type(root, edge_type)
    }

    /// Add an edge type to the level `level`.
    pub fn create_edge_type_in(
        &mut self,
        level: NodeId,
        edge_type: EdgeType,
    ) -> Result<EdgeTypeId, IHGraphError> {
        self.require_level(level)?;
        Ok(self.insert_edge_type(level, edge_type))
    }

    /// Connect two sibling nodes with an edge of one of their level's types.
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: EdgeTypeId,
    ) -> Result<EdgeId, IHGraphError> {
        let source_level = self
            .node(source)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Node, source.index()))?
            .parent;
        let target_level = self
            .node(target)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Node, target.index()))?
            .parent;
        if self.edge_type(edge_type).is_none() {
            return Err(IHGraphError::stale(ElementKind::EdgeType, edge_type.index()));
        }

        let level = match (source_level, target_level) {
            (Some(s), Some(t)) if s == t => s,
            _ => {
                return Err(IHGraphError::InvalidOperation(
                    "edge endpoints must be siblings of one level".to_string(),
                ));
            }
        };
        let owns_type = self
            .level_data(level)
            .is_some_and(|data| data.edge_types.contains(&edge_type));
        if !owns_type {
            return Err(IHGraphError::InvalidOperation(
                "edge type does not belong to the level of the edge".to_string(),
            ));
        }

        Ok(self.link(source, target, edge_type, Annotations::new()))
    }

    pub(crate) fn insert_node(
        &mut self,
        level: NodeId,
        identifier: String,
        kind: NodeKind,
        annotations: Annotations,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = IHNode::new(identifier, kind, self.uids.allocate());
        node.annotations = annotations;
        self.nodes.push(Some(node));
        self.attach_node(level, id);
        id
    }

    pub(crate) fn insert_edge_type(&mut self, level: NodeId, mut edge_type: EdgeType) -> EdgeTypeId {
        let id = EdgeTypeId(self.edge_types.len() as u32);
        edge_type.uid = self.uids.allocate();
        self.edge_types.push(Some(edge_type));
        if let Some(data) = self.level_data_mut(level) {
            data.edge_types.push(id);
        }
        id
    }

    /// Create an edge without validating levels.
    pub(crate) fn link(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: EdgeTypeId,
        annotations: Annotations,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(TransformationEdge {
            source,
            target,
            edge_type,
            annotations,
            uid: self.uids.allocate(),
        }));
        if let Some(node) = self.node_mut(source) {
            node.outgoing.push(id);
        }
        if let Some(node) = self.node_mut(target) {
            node.incoming.push(id);
        }
        id
    }

    /// Append `node` to `level` and make `level` its parent.
    pub(crate) fn attach_node(&mut self, level: NodeId, node: NodeId) {
        let attached = match self.level_data_mut(level) {
            Some(data) => {
                data.nodes.push(node);
                true
            }
            None => false,
        };
        if attached {
            if let Some(child) = self.node_mut(node) {
                child.parent = Some(level);
            }
        }
    }

    /// Append an existing edge type slot to `level`.
    pub(crate) fn attach_edge_type(&mut self, level: NodeId, edge_type: EdgeTypeId) {
        if let Some(data) = self.level_data_mut(level) {
            data.edge_types.push(edge_type);
        }
    }

    /// Empty the node and edge-type lists of `level`, returning them.
    ///
    /// The children keep `level` as their parent until they are attached
    /// elsewhere.
    pub(crate) fn take_level_contents(&mut self, level: NodeId) -> (Vec<NodeId>, Vec<EdgeTypeId>) {
        match self.level_data_mut(level) {
            Some(data) => (
                std::mem::take(&mut data.nodes),
                std::mem::take(&mut data.edge_types),
            ),
            None => (Vec::new(), Vec::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Take `node` out of its level's node list without touching its edges.
    ///
    /// The slot stays alive, so edges still pointing at the node keep
    /// resolving until the caller reroutes or removes them.
    pub(crate) fn unlink_node(&mut self, node: NodeId) {
        let parent = self.node_mut(node).and_then(|n| n.parent.take());
        if let Some(data) = parent.and_then(|p| self.level_data_mut(p)) {
            data.nodes.retain(|&child| child != node);
        }
    }

    /// Remove a node, every edge incident on it and, for a nested level,
    /// its whole subtree.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), IHGraphError> {
        if node == self.root {
            return Err(IHGraphError::InvalidOperation(
                "the root level cannot be removed".to_string(),
            ));
        }
        if self.node(node).is_none() {
            return Err(IHGraphError::stale(ElementKind::Node, node.index()));
        }
        self.unlink_node(node);

        let mut subtree = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            subtree.push(current);
            if let Some(data) = self.level_data(current) {
                stack.extend(data.nodes.iter().copied());
            }
        }

        for &member in &subtree {
            let incident: Vec<EdgeId> = match self.node(member) {
                Some(n) => n.incoming.iter().chain(n.outgoing.iter()).copied().collect(),
                None => Vec::new(),
            };
            for edge in incident {
                // Self loops appear in both lists.
                if self.edge(edge).is_some() {
                    self.remove_edge(edge)?;
                }
            }
        }
        for member in subtree {
            let owned_types = self
                .level_data(member)
                .map(|data| data.edge_types.clone())
                .unwrap_or_default();
            for edge_type in owned_types {
                self.free_edge_type(edge_type);
            }
            if let Some(slot) = self.nodes.get_mut(member.index()) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Remove an edge and its back-references.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<(), IHGraphError> {
        let removed = self
            .edges
            .get_mut(edge.index())
            .and_then(Option::take)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Edge, edge.index()))?;
        if let Some(node) = self.node_mut(removed.source) {
            node.outgoing.retain(|&e| e != edge);
        }
        if let Some(node) = self.node_mut(removed.target) {
            node.incoming.retain(|&e| e != edge);
        }
        Ok(())
    }

    /// Point `edge` at a new target node.
    pub fn set_edge_target(&mut self, edge: EdgeId, target: NodeId) -> Result<(), IHGraphError> {
        if self.node(target).is_none() {
            return Err(IHGraphError::stale(ElementKind::Node, target.index()));
        }
        let old = self
            .edge(edge)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Edge, edge.index()))?
            .target;
        if old == target {
            return Ok(());
        }
        if let Some(node) = self.node_mut(old) {
            node.incoming.retain(|&e| e != edge);
        }
        if let Some(node) = self.node_mut(target) {
            if !node.incoming.contains(&edge) {
                node.incoming.push(edge);
            }
        }
        if let Some(e) = self.edge_mut(edge) {
            e.target = target;
        }
        Ok(())
    }

    /// Point `edge` at a new source node.
    pub fn set_edge_source(&mut self, edge: EdgeId, source: NodeId) -> Result<(), IHGraphError> {
        if self.node(source).is_none() {
            return Err(IHGraphError::stale(ElementKind::Node, source.index()));
        }
        let old = self
            .edge(edge)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Edge, edge.index()))?
            .source;
        if old == source {
            return Ok(());
        }
        if let Some(node) = self.node_mut(old) {
            node.outgoing.retain(|&e| e != edge);
        }
        if let Some(node) = self.node_mut(source) {
            if !node.outgoing.contains(&edge) {
                node.outgoing.push(edge);
            }
        }
        if let Some(e) = self.edge_mut(edge) {
            e.source = source;
        }
        Ok(())
    }

    /// Change the type carried by `edge`.
    pub fn set_edge_type(&mut self, edge: EdgeId, edge_type: EdgeTypeId) -> Result<(), IHGraphError> {
        if self.edge_type(edge_type).is_none() {
            return Err(IHGraphError::stale(ElementKind::EdgeType, edge_type.index()));
        }
        let e = self
            .edge_mut(edge)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Edge, edge.index()))?;
        e.edge_type = edge_type;
        Ok(())
    }

    pub(crate) fn free_edge_type(&mut self, edge_type: EdgeTypeId) {
        if let Some(slot) = self.edge_types.get_mut(edge_type.index()) {
            *slot = None;
        }
    }
}

// =============================================================================
// LEVEL VIEW
// =============================================================================

/// Read-only view of one graph level of an `IHGraph`.
///
/// "Shallow" queries look at the direct children of the level; "deep"
/// queries recurse into nested levels. Every list follows insertion order.
#[derive(Debug, Clone, Copy)]
pub struct Level<'g> {
    graph: &'g IHGraph,
    id: NodeId,
}

impl<'g> Level<'g> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn graph(&self) -> &'g IHGraph {
        self.graph
    }

    /// The level as a node (identifier, annotations, edges).
    #[must_use]
    pub fn node(&self) -> Option<&'g IHNode> {
        self.graph.node(self.id)
    }

    #[must_use]
    pub fn identifier(&self) -> &'g str {
        self.node().map(|n| n.identifier.as_str()).unwrap_or_default()
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&'g TransformationConfiguration> {
        self.graph.level_data(self.id).map(|data| &data.configuration)
    }

    /// Direct children.
    #[must_use]
    pub fn nodes(&self) -> &'g [NodeId] {
        self.graph
            .level_data(self.id)
            .map(|data| data.nodes.as_slice())
            .unwrap_or_default()
    }

    /// Edge types owned by this level.
    #[must_use]
    pub fn edge_types(&self) -> &'g [EdgeTypeId] {
        self.graph
            .level_data(self.id)
            .map(|data| data.edge_types.as_slice())
            .unwrap_or_default()
    }

    /// Direct children that are leaves.
    #[must_use]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.children_where(IHNode::is_leaf)
    }

    /// Direct children that are nested levels.
    #[must_use]
    pub fn graph_nodes(&self) -> Vec<NodeId> {
        self.children_where(IHNode::is_graph)
    }

    fn children_where(&self, keep: impl Fn(&IHNode) -> bool) -> Vec<NodeId> {
        self.nodes()
            .iter()
            .copied()
            .filter(|&id| self.graph.node(id).is_some_and(&keep))
            .collect()
    }

    /// Every node below this level, nested levels included, in pre-order.
    #[must_use]
    pub fn deep_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_deep_nodes(&mut out);
        out
    }

    fn collect_deep_nodes(&self, out: &mut Vec<NodeId>) {
        for &child in self.nodes() {
            out.push(child);
            if let Some(nested) = self.graph.level(child) {
                nested.collect_deep_nodes(out);
            }
        }
    }

    /// Every leaf below this level.
    #[must_use]
    pub fn deep_leaf_nodes(&self) -> Vec<NodeId> {
        self.deep_nodes()
            .into_iter()
            .filter(|&id| self.graph.node(id).is_some_and(IHNode::is_leaf))
            .collect()
    }

    /// Edges incident on the direct children, without duplicates.
    ///
    /// For each child its incoming edges come first, then its outgoing ones.
    #[must_use]
    pub fn shallow_edges(&self) -> Vec<EdgeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_shallow_edges(&mut seen, &mut out);
        out
    }

    fn collect_shallow_edges(&self, seen: &mut BTreeSet<EdgeId>, out: &mut Vec<EdgeId>) {
        for &child in self.nodes() {
            if let Some(node) = self.graph.node(child) {
                for &edge in node.incoming.iter().chain(node.outgoing.iter()) {
                    if seen.insert(edge) {
                        out.push(edge);
                    }
                }
            }
        }
    }

    /// Shallow edges of this level and of every nested level.
    #[must_use]
    pub fn deep_edges(&self) -> Vec<EdgeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_deep_edges(&mut seen, &mut out);
        out
    }

    fn collect_deep_edges(&self, seen: &mut BTreeSet<EdgeId>, out: &mut Vec<EdgeId>) {
        self.collect_shallow_edges(seen, out);
        for &child in self.nodes() {
            if let Some(nested) = self.graph.level(child) {
                nested.collect_deep_edges(seen, out);
            }
        }
    }

    /// Distinct types carried by the shallow edges, in order of first use.
    #[must_use]
    pub fn shallow_edge_type_keys(&self) -> Vec<EdgeTypeKey> {
        let mut out: Vec<EdgeTypeKey> = Vec::new();
        for edge in self.shallow_edges() {
            let Some(ty) = self
                .graph
                .edge(edge)
                .and_then(|e| self.graph.edge_type(e.edge_type))
            else {
                continue;
            };
            if !out.iter().any(|key| ty.matches_key(key)) {
                out.push(ty.key());
            }
        }
        out
    }

    /// First direct child named `identifier`.
    #[must_use]
    pub fn find_shallow_node(&self, identifier: &str) -> Option<NodeId> {
        self.nodes().iter().copied().find(|&id| {
            self.graph
                .node(id)
                .is_some_and(|node| node.identifier == identifier)
        })
    }

    /// First node named `identifier`: direct children first, then nested
    /// levels in order.
    #[must_use]
    pub fn find_node(&self, identifier: &str) -> Option<NodeId> {
        if let Some(found) = self.find_shallow_node(identifier) {
            return Some(found);
        }
        self.nodes()
            .iter()
            .filter_map(|&child| self.graph.level(child))
            .find_map(|nested| nested.find_node(identifier))
    }

    /// First edge type named `identifier`: own types first, then nested levels.
    #[must_use]
    pub fn find_edge_type(&self, identifier: &str) -> Option<EdgeTypeId> {
        let own = self.find_own_edge_type(identifier);
        if own.is_some() {
            return own;
        }
        self.nodes()
            .iter()
            .filter_map(|&child| self.graph.level(child))
            .find_map(|nested| nested.find_edge_type(identifier))
    }

    /// First own edge type named `identifier`.
    #[must_use]
    pub fn find_own_edge_type(&self, identifier: &str) -> Option<EdgeTypeId> {
        self.edge_types().iter().copied().find(|&id| {
            self.graph
                .edge_type(id)
                .is_some_and(|ty| ty.identifier == identifier)
        })
    }

    /// Own edge type structurally equal to `key`.
    #[must_use]
    pub fn find_shallow_edge_type(&self, key: &EdgeTypeKey) -> Option<EdgeTypeId> {
        self.edge_types().iter().copied().find(|&id| {
            self.graph
                .edge_type(id)
                .is_some_and(|ty| ty.matches_key(key))
        })
    }

    #[must_use]
    pub fn has_edge_type(&self, key: &EdgeTypeKey) -> bool {
        self.find_shallow_edge_type(key).is_some()
    }

    /// Direct children without incoming edges.
    #[must_use]
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.children_where(|node| node.incoming.is_empty())
    }

    /// Direct children without outgoing edges.
    #[must_use]
    pub fn sink_nodes(&self) -> Vec<NodeId> {
        self.children_where(|node| node.outgoing.is_empty())
    }

    #[must_use]
    pub fn node_identifiers(&self) -> Vec<&'g str> {
        self.nodes()
            .iter()
            .filter_map(|&id| self.graph.node(id))
            .map(|node| node.identifier.as_str())
            .collect()
    }

    #[must_use]
    pub fn edge_type_identifiers(&self) -> Vec<&'g str> {
        self.edge_types()
            .iter()
            .filter_map(|&id| self.graph.edge_type(id))
            .map(|ty| ty.identifier.as_str())
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
