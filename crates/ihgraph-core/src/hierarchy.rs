//! # Induced Hierarchy and Flattening
//!
//! Induction repeatedly takes the highest-priority clique of the root level
//! and folds it into a nested level, until fewer than two edge types remain
//! on the root level. Every boundary edge of a folded clique is rerouted to
//! the new nested level and remembers its original in-clique endpoint in the
//! `flatTargetNode` / `flatSourceNode` annotations.
//!
//! Flattening is the inverse: nested levels are dissolved bottom-up, their
//! edge types merged into the parent, their leaves re-homed, and every
//! rerouted edge resolved back through its annotation.
//!
//! Both operations work on a copy and never touch the receiver.

use crate::annotations::Annotations;
use crate::edge::{EdgeType, EdgeTypeKey};
use crate::graph::IHGraph;
use crate::primitives::{DEFAULT_MAX_ITERATIONS, FLAT_SOURCE_NODE, FLAT_TARGET_NODE};
use crate::types::{EdgeId, EdgeTypeId, ElementKind, IHGraphError, NodeId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Which end of an edge is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    fn annotation_key(self) -> &'static str {
        match self {
            Endpoint::Source => FLAT_SOURCE_NODE,
            Endpoint::Target => FLAT_TARGET_NODE,
        }
    }
}

/// Snapshot of an edge running parallel to a folded clique.
///
/// Taken before the clique is removed, since removal matches edges by
/// identifier triple and may delete the original.
#[derive(Debug, Clone)]
struct ParallelEdge {
    edge: EdgeId,
    source: String,
    target: String,
    edge_type: EdgeType,
    annotations: Annotations,
}

// =============================================================================
// INDUCTION
// =============================================================================

impl IHGraph {
    /// Induced hierarchy with the default iteration bound.
    pub fn induce(&self) -> Result<IHGraph, IHGraphError> {
        self.induce_with_limit(DEFAULT_MAX_ITERATIONS)
    }

    /// Induced hierarchy, failing with `NonConvergent` after
    /// `max_iterations` folds.
    pub fn induce_with_limit(&self, max_iterations: usize) -> Result<IHGraph, IHGraphError> {
        let mut current = self.deep_clone()?;
        let mut iteration = 0usize;
        loop {
            if current.top().shallow_edge_type_keys().len() < 2 {
                debug!(iterations = iteration, "induction reached a fixed point");
                return Ok(current);
            }
            if iteration >= max_iterations {
                return Err(IHGraphError::NonConvergent { max_iterations });
            }
            current.fold_next_clique()?;
            // The copy drops unlinked nodes and edge types nothing uses anymore.
            current = current.deep_clone()?;
            iteration += 1;
        }
    }

    /// Fold the next clique of the root level into a nested level.
    fn fold_next_clique(&mut self) -> Result<NodeId, IHGraphError> {
        let root = self.root;
        let seed = self.highest_priority_node()?;
        let mut clique = self.next_clique()?;

        let clique_type = clique
            .top()
            .edge_types()
            .first()
            .and_then(|&ty| clique.edge_type(ty))
            .map(EdgeType::key)
            .ok_or(IHGraphError::NoEdges)?;
        clique.set_identifier(format!(
            "{}({})",
            clique_type.identifier,
            self.identifier_of(seed)
        ));
        debug!(level = clique.identifier(), nodes = clique.top().nodes().len(), "folding clique");

        let parallel = self.parallel_edges(root, &clique, &clique_type);
        let boundary = self.replace_clique(root, &clique, &clique, false)?;
        let nested = self.transplant(root, &clique)?;

        for edge in &parallel {
            self.copy_into_level(nested, edge)?;
            if self.edge(edge.edge).is_some() {
                self.remove_edge(edge.edge)?;
            }
        }
        for edge in boundary.incoming {
            self.adopt_boundary_edge(edge, nested, root, Endpoint::Target)?;
        }
        for edge in boundary.outgoing {
            self.adopt_boundary_edge(edge, nested, root, Endpoint::Source)?;
        }
        Ok(nested)
    }

    /// Edges of another type running between two members of `clique`.
    fn parallel_edges(
        &self,
        level: NodeId,
        clique: &IHGraph,
        clique_type: &EdgeTypeKey,
    ) -> Vec<ParallelEdge> {
        let Some(view) = self.level(level) else {
            return Vec::new();
        };
        let inside = |node: NodeId| {
            let identifier = self.identifier_of(node);
            view.find_shallow_node(identifier) == Some(node)
                && clique.top().find_shallow_node(identifier).is_some()
        };
        view.shallow_edges()
            .into_iter()
            .filter_map(|e| self.edge(e).map(|edge| (e, edge)))
            .filter(|(_, edge)| inside(edge.source) && inside(edge.target))
            .filter_map(|(e, edge)| {
                let edge_type = self.edge_type(edge.edge_type)?;
                if edge_type.matches_key(clique_type) {
                    return None;
                }
                Some(ParallelEdge {
                    edge: e,
                    source: self.identifier_of(edge.source).to_string(),
                    target: self.identifier_of(edge.target).to_string(),
                    edge_type: edge_type.clone(),
                    annotations: edge.annotations.clone(),
                })
            })
            .collect()
    }

    /// Recreate a parallel edge between the nodes of `level` with the same
    /// identifiers, adding its type to `level` if needed.
    fn copy_into_level(&mut self, level: NodeId, parallel: &ParallelEdge) -> Result<(), IHGraphError> {
        let view = self
            .level(level)
            .ok_or_else(|| IHGraphError::stale(ElementKind::Level, level.index()))?;
        let (Some(source), Some(target)) = (
            view.find_shallow_node(&parallel.source),
            view.find_shallow_node(&parallel.target),
        ) else {
            return Err(IHGraphError::node_not_found(format!(
                "{} or {}",
                parallel.source, parallel.target
            )));
        };
        let existing = view.find_shallow_edge_type(&parallel.edge_type.key());
        let ty = match existing {
            Some(existing) => existing,
            None => self.insert_edge_type(level, parallel.edge_type.clone()),
        };
        self.link(source, target, ty, parallel.annotations.clone());
        Ok(())
    }

    /// Move the in-clique end of a boundary edge onto the nested level,
    /// recording the original endpoint once.
    fn adopt_boundary_edge(
        &mut self,
        edge_id: EdgeId,
        nested: NodeId,
        level: NodeId,
        end: Endpoint,
    ) -> Result<(), IHGraphError> {
        let Some(edge) = self.edge(edge_id) else {
            return Ok(());
        };
        let (inner, outer) = match end {
            Endpoint::Target => (edge.target, edge.source),
            Endpoint::Source => (edge.source, edge.target),
        };
        if !self.node(outer).is_some_and(|n| n.parent == Some(level)) {
            warn!(
                edge = %self.edge_triple(edge_id).map(|t| t.to_string()).unwrap_or_default(),
                "boundary edge lost its outer endpoint, dropping it"
            );
            return self.remove_edge(edge_id);
        }

        let original = self.identifier_of(inner).to_string();
        if let Some(edge) = self.edge_mut(edge_id) {
            if !edge.annotations.has(end.annotation_key()) {
                edge.annotations.set_str(end.annotation_key(), original);
            }
        }
        match end {
            Endpoint::Target => self.set_edge_target(edge_id, nested),
            Endpoint::Source => self.set_edge_source(edge_id, nested),
        }
    }

    // =========================================================================
    // FLATTENING
    // =========================================================================

    /// Copy of the graph with every nested level dissolved into its parent.
    pub fn flatten(&self) -> Result<IHGraph, IHGraphError> {
        let mut flat = self.deep_clone()?;
        let root = flat.root;
        flat.flatten_level(root)?;
        Ok(flat)
    }

    fn flatten_level(&mut self, level: NodeId) -> Result<(), IHGraphError> {
        let nested = self
            .level(level)
            .map(|view| view.graph_nodes())
            .unwrap_or_default();
        for child in nested {
            self.flatten_level(child)?;
            self.dissolve_level(level, child)?;
        }
        Ok(())
    }

    /// Move the (already flat) contents of `nested` into `level` and
    /// remove `nested`.
    fn dissolve_level(&mut self, level: NodeId, nested: NodeId) -> Result<(), IHGraphError> {
        if self.level_data(nested).is_none() {
            return Err(IHGraphError::stale(ElementKind::Level, nested.index()));
        }
        let (children, edge_types) = self.take_level_contents(nested);

        let mut merged: BTreeMap<EdgeTypeId, EdgeTypeId> = BTreeMap::new();
        for ty in edge_types {
            let Some(key) = self.edge_type(ty).map(EdgeType::key) else {
                continue;
            };
            let existing = self
                .level(level)
                .and_then(|view| view.find_shallow_edge_type(&key));
            match existing {
                Some(existing) => {
                    merged.insert(ty, existing);
                }
                None => self.attach_edge_type(level, ty),
            }
        }

        for &child in &children {
            self.attach_node(level, child);
            let outgoing = self
                .node(child)
                .map(|n| n.outgoing.clone())
                .unwrap_or_default();
            for edge in outgoing {
                let current = self.edge(edge).map(|e| e.edge_type);
                if let Some(&replacement) = current.and_then(|ty| merged.get(&ty)) {
                    self.set_edge_type(edge, replacement)?;
                }
            }
        }
        for &ty in merged.keys() {
            self.free_edge_type(ty);
        }

        let (incoming, outgoing) = match self.node(nested) {
            Some(node) => (node.incoming.clone(), node.outgoing.clone()),
            None => (Vec::new(), Vec::new()),
        };
        for edge in incoming {
            self.resolve_flat_endpoint(edge, level, nested, &children, Endpoint::Target)?;
        }
        for edge in outgoing {
            self.resolve_flat_endpoint(edge, level, nested, &children, Endpoint::Source)?;
        }

        debug!(
            level = self.identifier_of(nested),
            leaves = children.len(),
            "dissolved nested level"
        );
        self.remove_node(nested)
    }

    /// Point one end of an edge incident on `nested` back at a leaf.
    ///
    /// The annotation is looked up among the former children of `nested`
    /// first, then among all nodes of `level`; without a match the first
    /// former child is used.
    fn resolve_flat_endpoint(
        &mut self,
        edge: EdgeId,
        level: NodeId,
        nested: NodeId,
        children: &[NodeId],
        end: Endpoint,
    ) -> Result<(), IHGraphError> {
        let wanted = self
            .edge(edge)
            .and_then(|e| e.annotations.get_str(end.annotation_key()))
            .map(str::to_string);

        let by_annotation = wanted.as_deref().and_then(|identifier| {
            children
                .iter()
                .copied()
                .find(|&c| self.identifier_of(c) == identifier)
                .or_else(|| {
                    self.level(level)
                        .and_then(|view| view.find_shallow_node(identifier))
                        .filter(|&found| found != nested)
                })
        });

        match by_annotation.or_else(|| children.first().copied()) {
            Some(node) => match end {
                Endpoint::Target => self.set_edge_target(edge, node),
                Endpoint::Source => self.set_edge_source(edge, node),
            },
            None => {
                warn!(
                    edge = %self.edge_triple(edge).map(|t| t.to_string()).unwrap_or_default(),
                    "edge on an empty nested level has nowhere to go, dropping it"
                );
                self.remove_edge(edge)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Define -Sequence(8)-> Add -Execute(2)-> Result
    fn sequence_execute() -> IHGraph {
        let mut graph = IHGraph::new("SequenceExecute");
        let define = graph.create_leaf("Define");
        let add = graph.create_leaf("Add");
        let result = graph.create_leaf("Result");
        let sequence = graph.create_edge_type(EdgeType::new("Sequence", 8));
        let execute = graph.create_edge_type(EdgeType::new("Execute", 2));
        graph.create_edge(define, add, sequence).expect("edge");
        graph.create_edge(add, result, execute).expect("edge");
        graph
    }

    #[test]
    fn single_type_graph_is_already_induced() {
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("a");
        let b = graph.create_leaf("b");
        let ty = graph.create_edge_type(EdgeType::new("T", 1));
        graph.create_edge(a, b, ty).expect("edge");

        let induced = graph.induce().expect("induce");
        assert!(induced.top().graph_nodes().is_empty());
        assert!(induced.structurally_equals(&graph));
    }

    #[test]
    fn induce_folds_highest_priority_clique() {
        let graph = sequence_execute();
        let induced = graph.induce().expect("induce");

        let top = induced.top();
        assert_eq!(top.node_identifiers(), vec!["Result", "Sequence(Define)"]);
        let nested = top.graph_nodes()[0];
        let view = induced.level(nested).expect("level");
        assert_eq!(view.node_identifiers(), vec!["Define", "Add"]);
        assert_eq!(view.edge_type_identifiers(), vec!["Sequence"]);

        let edges = top.shallow_edges();
        assert_eq!(edges.len(), 1);
        let edge = induced.edge(edges[0]).expect("edge");
        assert_eq!(edge.source(), nested);
        assert_eq!(edge.annotations.get_str(FLAT_SOURCE_NODE), Some("Add"));
    }

    #[test]
    fn induce_does_not_touch_the_receiver() {
        let graph = sequence_execute();
        let _ = graph.induce().expect("induce");
        assert_eq!(graph.top().nodes().len(), 3);
        assert!(graph.top().graph_nodes().is_empty());
    }

    #[test]
    fn induce_bound_is_enforced() {
        let graph = sequence_execute();
        let result = graph.induce_with_limit(0);
        assert!(matches!(
            result,
            Err(IHGraphError::NonConvergent { max_iterations: 0 })
        ));
    }

    #[test]
    fn flatten_reverses_induce() {
        let graph = sequence_execute();
        let flat = graph.induce().expect("induce").flatten().expect("flatten");
        assert!(flat.top().graph_nodes().is_empty());
        assert!(flat.structurally_equals(&graph));
    }

    #[test]
    fn flatten_of_flat_graph_is_a_copy() {
        let graph = sequence_execute();
        let flat = graph.flatten().expect("flatten");
        assert!(flat.structurally_equals(&graph));
    }

    #[test]
    fn parallel_edges_survive_the_round_trip() {
        // a -Hi-> b plus a -Lo-> b and b -Lo-> c.
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("a");
        let b = graph.create_leaf("b");
        let c = graph.create_leaf("c");
        let hi = graph.create_edge_type(EdgeType::new("Hi", 5));
        let lo = graph.create_edge_type(EdgeType::new("Lo", 1));
        graph.create_edge(a, b, hi).expect("edge");
        graph.create_edge(a, b, lo).expect("edge");
        graph.create_edge(b, c, lo).expect("edge");

        let induced = graph.induce().expect("induce");
        let nested = induced.top().graph_nodes()[0];
        assert_eq!(induced.level(nested).expect("level").shallow_edges().len(), 2);

        let flat = induced.flatten().expect("flatten");
        assert!(flat.structurally_equals(&graph));
    }

    #[test]
    fn parallel_edge_sharing_the_clique_type_identifier() {
        // a -T[5]-> b, a -T[1]-> b and b -U[0]-> c: the T[1] edge has the
        // same identifier triple as the folded T[5] edge.
        let mut graph = IHGraph::new("g");
        let a = graph.create_leaf("a");
        let b = graph.create_leaf("b");
        let c = graph.create_leaf("c");
        let high = graph.create_edge_type(EdgeType::new("T", 5));
        let low = graph.create_edge_type(EdgeType::new("T", 1));
        let u = graph.create_edge_type(EdgeType::new("U", 0));
        graph.create_edge(a, b, high).expect("edge");
        graph.create_edge(a, b, low).expect("edge");
        graph.create_edge(b, c, u).expect("edge");

        let induced = graph.induce().expect("induce");
        let top = induced.top();
        assert_eq!(top.node_identifiers(), vec!["c", "T(a)"]);
        let nested = induced.level(top.graph_nodes()[0]).expect("level");
        assert_eq!(nested.node_identifiers(), vec!["a", "b"]);
        assert_eq!(nested.shallow_edges().len(), 2);
        let mut priorities: Vec<i64> = nested
            .edge_types()
            .iter()
            .filter_map(|&ty| induced.edge_type(ty))
            .map(|ty| ty.priority)
            .collect();
        priorities.sort_unstable();
        assert_eq!(priorities, vec![1, 5]);

        let flat = induced.flatten().expect("flatten");
        assert!(flat.structurally_equals(&graph));
        assert_eq!(flat.top().edge_types().len(), 3);
    }

    #[test]
    fn flatten_defaults_to_first_leaf_without_annotation() {
        let mut graph = IHGraph::new("g");
        let x = graph.create_leaf("x");
        let nested = graph.create_level("n");
        graph.create_leaf_in(nested, "first").expect("leaf");
        graph.create_leaf_in(nested, "second").expect("leaf");
        let ty = graph.create_edge_type(EdgeType::new("T", 0));
        graph.create_edge(x, nested, ty).expect("edge");

        let flat = graph.flatten().expect("flatten");
        assert_eq!(flat.top().node_identifiers(), vec!["x", "first", "second"]);
        let edge = flat.edge(flat.top().shallow_edges()[0]).expect("edge");
        assert_eq!(flat.identifier_of(edge.target()), "first");
    }

    #[test]
    fn flatten_merges_structurally_equal_types() {
        let mut graph = IHGraph::new("g");
        let z = graph.create_leaf("z");
        let outer = graph.create_edge_type(EdgeType::new("T", 0));
        let nested = graph.create_level("n");
        let x = graph.create_leaf_in(nested, "x").expect("leaf");
        let y = graph.create_leaf_in(nested, "y").expect("leaf");
        let inner = graph
            .create_edge_type_in(nested, EdgeType::new("T", 0))
            .expect("type");
        graph.create_edge(x, y, inner).expect("edge");
        graph.create_edge(z, nested, outer).expect("edge");

        let flat = graph.flatten().expect("flatten");
        let top = flat.top();
        assert_eq!(top.edge_types().len(), 1);
        let edges = top.shallow_edges();
        assert_eq!(edges.len(), 2);
        for edge in edges {
            assert_eq!(flat.edge(edge).expect("edge").edge_type(), top.edge_types()[0]);
        }
    }

    #[test]
    fn edge_on_empty_level_is_dropped() {
        let mut graph = IHGraph::new("g");
        let x = graph.create_leaf("x");
        let nested = graph.create_level("empty");
        let ty = graph.create_edge_type(EdgeType::new("T", 0));
        graph.create_edge(x, nested, ty).expect("edge");

        let flat = graph.flatten().expect("flatten");
        assert_eq!(flat.top().node_identifiers(), vec!["x"]);
        assert!(flat.top().shallow_edges().is_empty());
    }
}
