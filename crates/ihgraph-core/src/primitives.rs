//! # Fixed Primitives
//!
//! Constants shared by the algebra engine and the factory format.
//! They are compiled into the binary and immutable at runtime.

/// Default bound on the number of induction iterations.
///
/// Every iteration moves at least one shallow edge into a nested level,
/// so a well formed graph converges long before this.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Edge annotation naming the original in-clique target of a rerouted edge.
///
/// Stamped by induction, consumed by flattening.
pub const FLAT_TARGET_NODE: &str = "flatTargetNode";

/// Edge annotation naming the original in-clique source of a rerouted edge.
pub const FLAT_SOURCE_NODE: &str = "flatSourceNode";

/// Prefix of identifiers synthesized for unnamed nodes during serialization.
pub const SYNTHETIC_ID_PREFIX: &str = "id";

/// First debug uid handed out by a default `UidAllocator`.
pub const DEBUG_UID_ORIGIN: u64 = 0x100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_annotation_keys_differ() {
        assert_ne!(FLAT_TARGET_NODE, FLAT_SOURCE_NODE);
    }

    #[test]
    fn iteration_bound_is_positive() {
        assert!(DEFAULT_MAX_ITERATIONS > 0);
    }
}
