//! # ihgraph-core
//!
//! Hierarchical transformation graph for multi-pass transformation
//! pipelines.
//!
//! Source fragments are leaf nodes; typed, prioritized transformation
//! edges connect them. Grouping the highest-priority clique of each edge
//! type into a nested level, over and over, *induces* a hierarchy whose
//! nesting order is the order the passes run in. *Flattening* undoes it.
//!
//! ## Layout
//!
//! - `types`, `primitives`: handles, enums, constants and errors
//! - `graph`: the arena (`IHGraph`) and the read-only `Level` view
//! - `clone`, `clique`, `hierarchy`: the rewriting algebra
//! - `equality`, `debug`: comparison and inspection
//! - `formats`: the JSON factory format
//! - `system`: summary metrics
//!
//! ## Constraints
//!
//! - No async, no I/O
//! - Deterministic: ordered collections only, insertion order preserved
//! - Handles are arena indices and never reused within one graph

// =============================================================================
// MODULES
// =============================================================================

pub mod annotations;
pub mod clique;
pub mod clone;
pub mod configuration;
pub mod debug;
pub mod edge;
pub mod equality;
pub mod formats;
pub mod graph;
pub mod hierarchy;
pub mod node;
pub mod primitives;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    EdgeId, EdgeTypeId, ElementKind, IHGraphError, NodeId, NodeStatus, Scope,
    TransformationDirection, Uid, UidAllocator,
};

// =============================================================================
// RE-EXPORTS: Graph Model
// =============================================================================

pub use annotations::Annotations;
pub use clique::CliqueBoundary;
pub use clone::{CloneFilter, CloneMappings, ClonedGraph};
pub use configuration::{ProcessorHandle, TransformationConfiguration};
pub use edge::{EdgeTriple, EdgeType, EdgeTypeKey, TransformationEdge};
pub use graph::{IHGraph, Level};
pub use node::{GraphLevel, IHNode, LeafNode, NodeKind};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    EdgeRecord, EdgeTypeRecord, GraphRecord, MAX_FACTORY_INPUT_SIZE, NodeRecord, graph_from_json,
    graph_to_json,
};

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::GraphMetrics;
