//! # Cliques
//!
//! A clique is the connected component of one edge type around a seed node,
//! walked along that type in both directions. It is returned as a standalone
//! `IHGraph` holding the visited nodes and the single edge type, which is the
//! unit a transformation pass operates on.
//!
//! The mutation half of this module removes a clique from a level, imports
//! one into a level, and replaces one with another while reporting the
//! boundary edges the caller has to reroute.

use crate::clone::{CloneFilter, CloneMappings};
use crate::edge::{EdgeTriple, EdgeTypeKey};
use crate::graph::IHGraph;
use crate::types::{EdgeId, EdgeTypeId, ElementKind, IHGraphError, NodeId, Scope};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, trace};

/// Edges crossing the border of a replaced clique.
///
/// `incoming` edges had their target inside the old clique, `outgoing`
/// edges had their source inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliqueBoundary {
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
}

impl CliqueBoundary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

// =============================================================================
// DETECTION
// =============================================================================

impl IHGraph {
    /// Highest edge-type priority over the root level's edges.
    pub fn highest_priority(&self, scope: Scope) -> Result<i64, IHGraphError> {
        let edges = match scope {
            Scope::Shallow => self.top().shallow_edges(),
            Scope::Deep => self.top().deep_edges(),
        };
        edges
            .into_iter()
            .filter_map(|e| self.edge(e))
            .filter_map(|e| self.edge_type(e.edge_type))
            .map(|ty| ty.priority)
            .max()
            .ok_or(IHGraphError::NoEdges)
    }

    /// Source of the first shallow edge carrying the highest priority.
    pub fn highest_priority_node(&self) -> Result<NodeId, IHGraphError> {
        let max = self.highest_priority(Scope::Shallow)?;
        self.top()
            .shallow_edges()
            .into_iter()
            .filter_map(|e| self.edge(e))
            .find(|e| self.priority_of(e.edge_type) == Some(max))
            .map(|e| e.source)
            .ok_or(IHGraphError::NoEdges)
    }

    fn priority_of(&self, edge_type: EdgeTypeId) -> Option<i64> {
        self.edge_type(edge_type).map(|ty| ty.priority)
    }

    /// Clique of `edge_type` around `seed`, cloned out of the seed's level.
    pub fn get_clique(&self, seed: NodeId, edge_type: EdgeTypeId) -> Result<IHGraph, IHGraphError> {
        let key = self
            .edge_type(edge_type)
            .ok_or_else(|| IHGraphError::stale(ElementKind::EdgeType, edge_type.index()))?
            .key();
        self.clique_for_key(seed, &key)
    }

    fn clique_for_key(&self, seed: NodeId, key: &EdgeTypeKey) -> Result<IHGraph, IHGraphError> {
        if seed == self.root {
            return Err(IHGraphError::InvalidOperation(
                "the root level cannot seed a clique".to_string(),
            ));
        }
        let level = self.owning_level(seed)?;

        let mut visited = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.node(current) else {
                continue;
            };
            for &edge_id in node.incoming.iter().chain(node.outgoing.iter()) {
                let Some(edge) = self.edge(edge_id) else {
                    continue;
                };
                let same_type = self
                    .edge_type(edge.edge_type)
                    .is_some_and(|ty| ty.matches_key(key));
                if !same_type {
                    continue;
                }
                let other = if edge.source == current {
                    edge.target
                } else {
                    edge.source
                };
                let sibling = self.node(other).is_some_and(|n| n.parent == Some(level));
                if sibling && visited.insert(other) {
                    queue.push_back(other);
                }
            }
        }

        let identifiers: Vec<String> = visited
            .iter()
            .filter_map(|&id| self.node(id))
            .map(|node| node.identifier.clone())
            .collect();
        trace!(edge_type = %key, nodes = identifiers.len(), "clique collected");
        let filter = CloneFilter::new(identifiers, vec![key.clone()]);
        Ok(self.clone_level_with_mappings(level, &filter)?.graph)
    }

    /// Clique of the highest-priority type at the highest-priority node.
    pub fn next_clique(&self) -> Result<IHGraph, IHGraphError> {
        let max = self.highest_priority(Scope::Shallow)?;
        let seed = self.highest_priority_node()?;
        let edge_type = self
            .node(seed)
            .into_iter()
            .flat_map(|node| node.outgoing.iter())
            .filter_map(|&e| self.edge(e))
            .map(|e| e.edge_type)
            .find(|&ty| self.priority_of(ty) == Some(max))
            .ok_or(IHGraphError::NoEdges)?;
        debug!(
            seed = %self.node(seed).map(|n| n.identifier.as_str()).unwrap_or_default(),
            priority = max,
            "next clique"
        );
        self.get_clique(seed, edge_type)
    }

    /// Every clique of an immediate edge type, at any depth.
    ///
    /// A node/type pair already covered by a collected clique does not start
    /// a new one.
    pub fn immediate_cliques(&self) -> Result<Vec<IHGraph>, IHGraphError> {
        let mut cliques: Vec<IHGraph> = Vec::new();
        for node_id in self.top().deep_nodes() {
            let Some(node) = self.node(node_id) else {
                continue;
            };
            let mut seen: Vec<EdgeTypeKey> = Vec::new();
            for &edge_id in &node.outgoing {
                let Some(ty) = self
                    .edge(edge_id)
                    .and_then(|e| self.edge_type(e.edge_type))
                else {
                    continue;
                };
                if !ty.immediate || seen.iter().any(|key| ty.matches_key(key)) {
                    continue;
                }
                let key = ty.key();
                seen.push(key.clone());

                let covered = cliques.iter().any(|clique| {
                    let top = clique.top();
                    top.find_shallow_node(&node.identifier).is_some()
                        && top.find_own_edge_type(&ty.identifier).is_some()
                });
                if !covered {
                    cliques.push(self.clique_for_key(node_id, &key)?);
                }
            }
        }
        Ok(cliques)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Import every node of `clique` into `level`, nested levels included.
    ///
    /// Clique edge types reuse an edge type of `level` with the same
    /// identifier when there is one; imported edges are pointed at it.
    /// Returns the handles of the imported top-level nodes in clique order.
    pub fn add_clique(&mut self, level: NodeId, clique: &IHGraph) -> Result<Vec<NodeId>, IHGraphError> {
        self.require_level(level)?;

        let mut maps = CloneMappings::default();
        for &ty in clique.top().edge_types() {
            let Some(edge_type) = clique.edge_type(ty) else {
                continue;
            };
            let existing = self
                .level(level)
                .and_then(|view| view.find_own_edge_type(&edge_type.identifier));
            let target = match existing {
                Some(id) => id,
                None => self.insert_edge_type(level, edge_type.clone()),
            };
            maps.edge_types.insert(ty, target);
        }

        clique.clone_level(clique.root, self, level, &CloneFilter::all(), &mut maps)?;
        Ok(clique
            .top()
            .nodes()
            .iter()
            .filter_map(|node| maps.nodes.get(node).copied())
            .collect())
    }

    /// Remove every shallow edge of `level` whose identifier triple is in
    /// `triples`. Returns how many edges were removed.
    pub fn remove_edges_matching(
        &mut self,
        level: NodeId,
        triples: &BTreeSet<EdgeTriple>,
    ) -> Result<usize, IHGraphError> {
        let view = self
            .level(level)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, level.index()))?;
        let doomed: Vec<EdgeId> = view
            .shallow_edges()
            .into_iter()
            .filter(|&e| self.edge_triple(e).is_some_and(|t| triples.contains(&t)))
            .collect();
        for &edge in &doomed {
            self.remove_edge(edge)?;
        }
        Ok(doomed.len())
    }

    /// Take the nodes of `clique` out of `level`.
    ///
    /// Edges matching a clique edge are removed; nodes are unlinked by
    /// identifier, first match. Edges with only one endpoint in the clique
    /// stay attached to the unlinked node for the caller to reroute.
    pub fn remove_clique(&mut self, level: NodeId, clique: &IHGraph) -> Result<(), IHGraphError> {
        let members = self.resolve_members(level, clique)?;
        let triples: BTreeSet<EdgeTriple> = clique
            .top()
            .shallow_edges()
            .into_iter()
            .filter_map(|e| clique.edge_triple(e))
            .collect();

        let removed = self.remove_edges_matching(level, &triples)?;
        for member in members {
            self.unlink_node(member);
        }
        trace!(edges = removed, "clique removed");
        Ok(())
    }

    fn resolve_members(&self, level: NodeId, clique: &IHGraph) -> Result<Vec<NodeId>, IHGraphError> {
        let view = self
            .level(level)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, level.index()))?;
        let mut members = Vec::new();
        for identifier in clique.top().node_identifiers() {
            let id = view
                .find_shallow_node(identifier)
                .ok_or_else(|| IHGraphError::node_not_found(identifier))?;
            if !members.contains(&id) {
                members.push(id);
            }
        }
        Ok(members)
    }

    /// Replace the clique `old` in `level` by `new`.
    ///
    /// Boundary edges are collected before `old` is removed. With
    /// `add_new_nodes` the nodes of `new` are imported and every boundary
    /// edge is moved to the node of `new` with the identifier of its old
    /// endpoint, or to the first node of `new`. Without it the boundary
    /// edges are returned still attached to the unlinked old nodes.
    pub fn replace_clique(
        &mut self,
        level: NodeId,
        old: &IHGraph,
        new: &IHGraph,
        add_new_nodes: bool,
    ) -> Result<CliqueBoundary, IHGraphError> {
        let members: BTreeSet<NodeId> = self.resolve_members(level, old)?.into_iter().collect();
        let new_identifiers = new.top().node_identifiers();
        let remap = |identifier: &str| {
            new_identifiers
                .iter()
                .position(|&candidate| candidate == identifier)
                .unwrap_or(0)
        };

        let view = self
            .level(level)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, level.index()))?;
        let mut boundary = CliqueBoundary::default();
        let mut incoming_slots = Vec::new();
        let mut outgoing_slots = Vec::new();
        for edge_id in view.shallow_edges() {
            let Some(edge) = self.edge(edge_id) else {
                continue;
            };
            let source_inside = members.contains(&edge.source);
            let target_inside = members.contains(&edge.target);
            if target_inside && !source_inside {
                boundary.incoming.push(edge_id);
                incoming_slots.push(remap(self.identifier_of(edge.target)));
            } else if source_inside && !target_inside {
                boundary.outgoing.push(edge_id);
                outgoing_slots.push(remap(self.identifier_of(edge.source)));
            }
        }

        self.remove_clique(level, old)?;
        if new_identifiers.is_empty() || !add_new_nodes {
            return Ok(boundary);
        }

        let imported = self.add_clique(level, new)?;
        for (&edge, slot) in boundary.incoming.iter().zip(incoming_slots) {
            if let Some(&node) = imported.get(slot) {
                self.set_edge_target(edge, node)?;
            }
        }
        for (&edge, slot) in boundary.outgoing.iter().zip(outgoing_slots) {
            if let Some(&node) = imported.get(slot) {
                self.set_edge_source(edge, node)?;
            }
        }
        Ok(boundary)
    }
}

// =============================================================================
// TESTS
// =============================================================================
