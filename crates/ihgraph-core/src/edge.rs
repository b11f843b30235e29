//! # Edges and Edge Types
//!
//! An `EdgeType` names one transformation pass: its priority decides which
//! clique is induced first, its `immediate` flag marks cliques that run
//! independently of priority. A `TransformationEdge` connects two sibling
//! nodes of one graph level and carries exactly one edge type of that level.

use crate::annotations::Annotations;
use crate::types::{EdgeTypeId, NodeId, TransformationDirection, Uid};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// EDGE TYPE
// =============================================================================

/// Structural identity of an edge type.
///
/// Two edge types are the same type when identifier, priority and immediate
/// flag all match. The identifier alone does not imply equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeTypeKey {
    pub identifier: String,
    pub priority: i64,
    pub immediate: bool,
}

impl fmt::Display for EdgeTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}", self.identifier, self.priority)?;
        if self.immediate {
            f.write_str(", immediate")?;
        }
        f.write_str("]")
    }
}

/// A typed transformation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeType {
    pub identifier: String,
    pub priority: i64,
    pub immediate: bool,
    pub direction: TransformationDirection,
    pub annotations: Annotations,
    pub(crate) uid: Uid,
}

impl EdgeType {
    /// Create a non-immediate control-flow edge type.
    #[must_use]
    pub fn new(identifier: impl Into<String>, priority: i64) -> Self {
        Self {
            identifier: identifier.into(),
            priority,
            immediate: false,
            direction: TransformationDirection::default(),
            annotations: Annotations::new(),
            uid: Uid::default(),
        }
    }

    /// Builder: set the immediate flag.
    #[must_use]
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Builder: set the processor direction.
    #[must_use]
    pub fn with_direction(mut self, direction: TransformationDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    pub fn set_immediate(&mut self, immediate: bool) {
        self.immediate = immediate;
    }

    pub fn set_direction(&mut self, direction: TransformationDirection) {
        self.direction = direction;
    }

    /// Debug uid assigned when the type was added to a graph.
    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Structural identity of this type.
    #[must_use]
    pub fn key(&self) -> EdgeTypeKey {
        EdgeTypeKey {
            identifier: self.identifier.clone(),
            priority: self.priority,
            immediate: self.immediate,
        }
    }

    /// Structural type equality.
    #[must_use]
    pub fn same_type(&self, other: &EdgeType) -> bool {
        self.identifier == other.identifier
            && self.priority == other.priority
            && self.immediate == other.immediate
    }

    #[must_use]
    pub fn matches_key(&self, key: &EdgeTypeKey) -> bool {
        self.identifier == key.identifier
            && self.priority == key.priority
            && self.immediate == key.immediate
    }
}

// =============================================================================
// TRANSFORMATION EDGE
// =============================================================================

/// A directed, typed edge between two sibling nodes.
///
/// Edges are not listed by their level; they are reached through the
/// `incoming`/`outgoing` lists of their endpoints.
#[derive(Debug, Clone)]
pub struct TransformationEdge {
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    pub(crate) edge_type: EdgeTypeId,
    pub annotations: Annotations,
    pub(crate) uid: Uid,
}

impl TransformationEdge {
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.source
    }

    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    #[must_use]
    pub fn edge_type(&self) -> EdgeTypeId {
        self.edge_type
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }
}

/// Identifier triple of an edge: the form in which edges are compared
/// across graphs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeTriple {
    pub source: String,
    pub target: String,
    pub edge_type: String,
}

impl fmt::Display for EdgeTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.source, self.edge_type, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_needs_all_three_fields() {
        let a = EdgeType::new("Sequence", 8);
        let b = EdgeType::new("Sequence", 8).with_direction(TransformationDirection::Dependency);
        let c = EdgeType::new("Sequence", 2);
        let d = EdgeType::new("Sequence", 8).with_immediate(true);

        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
        assert!(!a.same_type(&d));
    }

    #[test]
    fn key_matches_value() {
        let ty = EdgeType::new("Execute", 2).with_immediate(true);
        let key = ty.key();
        assert!(ty.matches_key(&key));
        assert_eq!(key.to_string(), "Execute[2, immediate]");
    }

    #[test]
    fn setters_change_identity() {
        let mut ty = EdgeType::new("Execute", 2);
        let before = ty.key();
        ty.set_priority(5);
        ty.set_immediate(true);
        assert_ne!(ty.key(), before);
        ty.set_direction(TransformationDirection::Dependency);
        assert_eq!(ty.direction, TransformationDirection::Dependency);
    }

    #[test]
    fn triple_display() {
        let triple = EdgeTriple {
            source: "Define".to_string(),
            target: "Add".to_string(),
            edge_type: "Sequence".to_string(),
        };
        assert_eq!(triple.to_string(), "Define -Sequence-> Add");
    }
}
