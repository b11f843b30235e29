//! # Core Type Definitions
//!
//! This module contains the small value types shared by every layer of the
//! hierarchical transformation graph:
//! - Arena handles (`NodeId`, `EdgeId`, `EdgeTypeId`)
//! - Debug identity (`Uid`, `UidAllocator`)
//! - Node and edge-type enums (`NodeStatus`, `TransformationDirection`)
//! - Query scope (`Scope`) and element kinds for error reporting
//! - Error types (`IHGraphError`)
//!
//! ## Handle Semantics
//!
//! Handles are plain indices into the arena of the `IHGraph` that issued them.
//! They are `Copy`, `Ord` and never reused within one graph, so a stale handle
//! resolves to `None` instead of aliasing a newer element.

use crate::primitives::DEBUG_UID_ORIGIN;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ARENA HANDLES
// =============================================================================

/// Handle of a node (leaf or nested graph level) inside one `IHGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

/// Handle of a transformation edge inside one `IHGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) u32);

/// Handle of an edge type inside one `IHGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeTypeId(pub(crate) u32);

impl NodeId {
    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeTypeId {
    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// DEBUG IDENTITY
// =============================================================================

/// Debug identity of a graph element.
///
/// Uids only appear in debug output. They never take part in lookup,
/// equality or serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uid(pub u64);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Monotonic source of debug uids.
///
/// Every `IHGraph` owns one allocator. Clones continue from the state of the
/// allocator they were cloned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidAllocator {
    next: u64,
}

impl UidAllocator {
    /// Create an allocator that hands out `start`, `start + 1`, ...
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Hand out the next uid.
    pub fn allocate(&mut self) -> Uid {
        let uid = Uid(self.next);
        self.next = self.next.saturating_add(1);
        uid
    }

    /// Peek at the uid the next call to `allocate` returns.
    #[must_use]
    pub const fn peek(&self) -> Uid {
        Uid(self.next)
    }
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self::starting_at(DEBUG_UID_ORIGIN)
    }
}

// =============================================================================
// NODE & EDGE-TYPE ENUMS
// =============================================================================

/// Processing status of a leaf node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Undefined,
    Success,
    Warning,
    Error,
}

impl NodeStatus {
    /// Lowercase name used by the factory format and debug output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Undefined => "undefined",
            NodeStatus::Success => "success",
            NodeStatus::Warning => "warning",
            NodeStatus::Error => "error",
        }
    }
}

/// Direction in which a processor bound to an edge type walks its clique.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransformationDirection {
    /// Follow edges from source to target.
    #[default]
    Controlflow,
    /// Follow edges from target back to source.
    Dependency,
}

/// Which edge set a priority query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Edges incident on the direct children of the level.
    Shallow,
    /// Shallow edges plus those of every nested level.
    Deep,
}

/// Kind of element named in a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Level,
    Edge,
    EdgeType,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Node => "node",
            ElementKind::Level => "graph level",
            ElementKind::Edge => "edge",
            ElementKind::EdgeType => "edge type",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or rewriting an `IHGraph`.
///
/// Every error is fatal to the single operation that raised it. Fallible
/// operations validate before mutating, so the graph is never left half
/// rewritten.
#[derive(Debug, Error)]
pub enum IHGraphError {
    /// A priority query ran over an empty edge set.
    #[error("graph has no edges")]
    NoEdges,

    /// An identifier or handle did not resolve.
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: ElementKind,
        identifier: String,
    },

    /// A clone met an edge whose endpoint lives outside the cloned hierarchy.
    #[error("corrupted mapping: {0}")]
    CorruptedMapping(String),

    /// Induction did not reach a fixed point within the iteration bound.
    #[error("induction did not converge within {max_iterations} iterations")]
    NonConvergent { max_iterations: usize },

    /// Factory input referenced something that does not exist.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The operation is not allowed on this element.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl IHGraphError {
    pub(crate) fn node_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ElementKind::Node,
            identifier: identifier.into(),
        }
    }

    pub(crate) fn stale(kind: ElementKind, index: usize) -> Self {
        Self::NotFound {
            kind,
            identifier: format!("handle {}", index),
        }
    }
}

impl From<serde_json::Error> for IHGraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_allocator_is_monotonic() {
        let mut uids = UidAllocator::starting_at(7);
        assert_eq!(uids.allocate(), Uid(7));
        assert_eq!(uids.allocate(), Uid(8));
        assert_eq!(uids.peek(), Uid(9));
    }

    #[test]
    fn uid_allocator_default_origin() {
        let uids = UidAllocator::default();
        assert_eq!(uids.peek(), Uid(DEBUG_UID_ORIGIN));
    }

    #[test]
    fn uid_display_is_hex() {
        assert_eq!(Uid(255).to_string(), "#ff");
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&NodeStatus::Warning).expect("serialize");
        assert_eq!(json, "\"warning\"");
        assert_eq!(NodeStatus::default(), NodeStatus::Undefined);
    }

    #[test]
    fn direction_round_trips() {
        let json = serde_json::to_string(&TransformationDirection::Dependency).expect("serialize");
        let back: TransformationDirection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, TransformationDirection::Dependency);
    }

    #[test]
    fn not_found_message_names_kind() {
        let err = IHGraphError::node_not_found("Add");
        assert_eq!(err.to_string(), "node not found: Add");
    }
}
