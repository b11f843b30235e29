//! # Structural Clone with Mappings
//!
//! One recursive traversal copies a graph level into a fresh `IHGraph` (or
//! into a level of another graph) and records, for every copied element,
//! which handle it came from.
//!
//! A `CloneFilter` restricts the copy: top-level nodes are selected by
//! identifier, edge types by structural key. Nested levels that pass the
//! filter are copied whole. Every edge type used by an outgoing edge of a
//! copied node is copied exactly once, whether or not the edge's target
//! survives; edges whose target or type did not survive are pruned.

use crate::annotations::Annotations;
use crate::edge::EdgeTypeKey;
use crate::graph::IHGraph;
use crate::node::{GraphLevel, NodeKind};
use crate::types::{EdgeId, EdgeTypeId, ElementKind, IHGraphError, NodeId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

// =============================================================================
// FILTER & MAPPINGS
// =============================================================================

/// Selection applied to the top level of a clone. Empty sets accept all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneFilter {
    pub nodes: BTreeSet<String>,
    pub edge_types: Vec<EdgeTypeKey>,
}

impl CloneFilter {
    /// Filter accepting everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter selecting nodes by identifier and edge types by key.
    #[must_use]
    pub fn new<I, S>(nodes: I, edge_types: Vec<EdgeTypeKey>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            edge_types,
        }
    }

    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.nodes.is_empty() && self.edge_types.is_empty()
    }

    fn accepts_node(&self, identifier: &str) -> bool {
        self.nodes.is_empty() || self.nodes.contains(identifier)
    }

    fn accepts_type(&self, key: &EdgeTypeKey) -> bool {
        self.edge_types.is_empty() || self.edge_types.contains(key)
    }
}

/// Original handle to copied handle, per element kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneMappings {
    pub nodes: BTreeMap<NodeId, NodeId>,
    pub edge_types: BTreeMap<EdgeTypeId, EdgeTypeId>,
    pub edges: BTreeMap<EdgeId, EdgeId>,
}

/// A freshly built graph together with the mappings that produced it.
#[derive(Debug)]
pub struct ClonedGraph {
    pub graph: IHGraph,
    pub mappings: CloneMappings,
}

// =============================================================================
// CLONE
// =============================================================================

impl IHGraph {
    /// Clone the root level through `filter`.
    pub fn clone_with_mappings(&self, filter: &CloneFilter) -> Result<ClonedGraph, IHGraphError> {
        self.clone_level_with_mappings(self.root, filter)
    }

    /// Clone the level `level` into a standalone graph through `filter`.
    pub fn clone_level_with_mappings(
        &self,
        level: NodeId,
        filter: &CloneFilter,
    ) -> Result<ClonedGraph, IHGraphError> {
        let source = self
            .node(level)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, level.index()))?;
        let configuration = match &source.kind {
            NodeKind::Graph(data) => data.configuration.clone(),
            NodeKind::Leaf(_) => {
                return Err(IHGraphError::stale(ElementKind::Level, level.index()));
            }
        };

        let mut graph = IHGraph::with_uid_allocator(source.identifier.clone(), self.uids.clone());
        let root = graph.root;
        if let Some(node) = graph.node_mut(root) {
            node.annotations = source.annotations.clone();
        }
        if let Some(config) = graph.configuration_mut(root) {
            *config = configuration;
        }

        let mut mappings = CloneMappings::default();
        mappings.nodes.insert(level, root);
        self.clone_level(level, &mut graph, root, filter, &mut mappings)?;
        Ok(ClonedGraph { graph, mappings })
    }

    /// Full unfiltered copy of the graph.
    pub fn deep_clone(&self) -> Result<IHGraph, IHGraphError> {
        Ok(self.clone_with_mappings(&CloneFilter::all())?.graph)
    }

    /// Standalone copy of the nested level `level`.
    pub fn extract(&self, level: NodeId) -> Result<IHGraph, IHGraphError> {
        Ok(self
            .clone_level_with_mappings(level, &CloneFilter::all())?
            .graph)
    }

    /// Copy the whole of `other` into `level` as a new nested level.
    ///
    /// Returns the handle of the new level.
    pub fn transplant(&mut self, level: NodeId, other: &IHGraph) -> Result<NodeId, IHGraphError> {
        let source = other
            .node(other.root)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, other.root.index()))?;
        if self.level_data(level).is_none() {
            return Err(IHGraphError::stale(ElementKind::Level, level.index()));
        }
        let configuration = other
            .level_data(other.root)
            .map(|data| data.configuration.clone())
            .unwrap_or_default();
        let nested = self.insert_node(
            level,
            source.identifier.clone(),
            NodeKind::Graph(GraphLevel {
                configuration,
                ..GraphLevel::default()
            }),
            source.annotations.clone(),
        );

        let mut mappings = CloneMappings::default();
        other.clone_level(other.root, self, nested, &CloneFilter::all(), &mut mappings)?;
        Ok(nested)
    }

    /// Copy the children of `source_level` into `dest_level` of `dest`.
    ///
    /// Edge types already present in `maps.edge_types` are reused instead of
    /// copied; callers seed the map to merge types into an existing level.
    pub(crate) fn clone_level(
        &self,
        source_level: NodeId,
        dest: &mut IHGraph,
        dest_level: NodeId,
        filter: &CloneFilter,
        maps: &mut CloneMappings,
    ) -> Result<(), IHGraphError> {
        let Some(level) = self.level_data(source_level) else {
            return Err(IHGraphError::stale(ElementKind::Level, source_level.index()));
        };

        let mut pending: Vec<EdgeId> = Vec::new();
        for &child in &level.nodes {
            let Some(node) = self.node(child) else {
                continue;
            };
            if !filter.accepts_node(&node.identifier) {
                continue;
            }
            let copy = match &node.kind {
                NodeKind::Leaf(leaf) => dest.insert_node(
                    dest_level,
                    node.identifier.clone(),
                    NodeKind::Leaf(leaf.clone()),
                    node.annotations.clone(),
                ),
                NodeKind::Graph(inner) => {
                    let copy = dest.insert_node(
                        dest_level,
                        node.identifier.clone(),
                        NodeKind::Graph(GraphLevel {
                            configuration: inner.configuration.clone(),
                            ..GraphLevel::default()
                        }),
                        node.annotations.clone(),
                    );
                    self.clone_level(child, dest, copy, &CloneFilter::all(), maps)?;
                    copy
                }
            };
            maps.nodes.insert(child, copy);
            pending.extend(node.outgoing.iter().copied());
        }

        // Types are collected before targets are resolved.
        let mut used: Vec<EdgeTypeId> = Vec::new();
        let mut surviving: Vec<EdgeId> = Vec::new();
        for edge_id in pending {
            let Some(edge) = self.edge(edge_id) else {
                continue;
            };
            let Some(ty) = self.edge_type(edge.edge_type) else {
                continue;
            };
            if !filter.accepts_type(&ty.key()) {
                continue;
            }
            if !used.contains(&edge.edge_type) {
                used.push(edge.edge_type);
            }
            let target_is_sibling = self
                .node(edge.target)
                .is_some_and(|t| t.parent == Some(source_level));
            if target_is_sibling {
                if maps.nodes.contains_key(&edge.target) {
                    surviving.push(edge_id);
                }
                continue;
            }

            let target_attached = self
                .node(edge.target)
                .is_some_and(|t| t.parent.is_some() || edge.target == self.root);
            if target_attached && filter.nodes.is_empty() {
                return Err(IHGraphError::CorruptedMapping(format!(
                    "edge {} leaves level {}",
                    self.edge_triple(edge_id)
                        .map(|t| t.to_string())
                        .unwrap_or_default(),
                    self.node(source_level)
                        .map(|n| n.identifier.as_str())
                        .unwrap_or_default(),
                )));
            }
            warn!(
                edge = %self.edge_triple(edge_id).map(|t| t.to_string()).unwrap_or_default(),
                "dropping edge with unresolved target during clone"
            );
        }

        // Copy each used type once, in declaration order, then any stray ones.
        let mut ordered: Vec<EdgeTypeId> = level
            .edge_types
            .iter()
            .copied()
            .filter(|ty| used.contains(ty))
            .collect();
        for ty in used {
            if !ordered.contains(&ty) {
                ordered.push(ty);
            }
        }
        for ty in ordered {
            if maps.edge_types.contains_key(&ty) {
                continue;
            }
            if let Some(edge_type) = self.edge_type(ty) {
                let copy = dest.insert_edge_type(dest_level, edge_type.clone());
                maps.edge_types.insert(ty, copy);
            }
        }

        for edge_id in surviving {
            let Some(edge) = self.edge(edge_id) else {
                continue;
            };
            let (Some(&source), Some(&target), Some(&ty)) = (
                maps.nodes.get(&edge.source),
                maps.nodes.get(&edge.target),
                maps.edge_types.get(&edge.edge_type),
            ) else {
                continue;
            };
            let annotations: Annotations = edge.annotations.clone();
            let copy = dest.link(source, target, ty, annotations);
            maps.edges.insert(edge_id, copy);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
