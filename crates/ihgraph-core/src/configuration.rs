//! # Transformation Configuration
//!
//! Binds edge types to the processors that execute their cliques.
//!
//! The processor engine lives outside this crate; a binding only stores an
//! opaque `ProcessorHandle`. Bindings are keyed by edge-type identifier and
//! copied by value whenever their graph level is cloned.

use crate::edge::EdgeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque reference to an external transformation processor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessorHandle(pub String);

impl ProcessorHandle {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Map from edge-type identifier to processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformationConfiguration {
    processors: BTreeMap<String, ProcessorHandle>,
}

impl TransformationConfiguration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processor bound to `edge_type`, matched by identifier.
    #[must_use]
    pub fn get(&self, edge_type: &EdgeType) -> Option<&ProcessorHandle> {
        self.processors.get(&edge_type.identifier)
    }

    /// Processor bound to the edge type named `identifier`.
    #[must_use]
    pub fn get_by_id(&self, identifier: &str) -> Option<&ProcessorHandle> {
        self.processors.get(identifier)
    }

    /// Bind `processor` to `edge_type`. Returns the previous binding.
    pub fn set(
        &mut self,
        edge_type: &EdgeType,
        processor: ProcessorHandle,
    ) -> Option<ProcessorHandle> {
        self.processors
            .insert(edge_type.identifier.clone(), processor)
    }

    /// Bind `processor` to the edge type named `identifier`.
    pub fn set_by_id(
        &mut self,
        identifier: impl Into<String>,
        processor: ProcessorHandle,
    ) -> Option<ProcessorHandle> {
        self.processors.insert(identifier.into(), processor)
    }

    pub fn remove(&mut self, identifier: &str) -> Option<ProcessorHandle> {
        self.processors.remove(identifier)
    }

    /// Bindings in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessorHandle)> {
        self.processors.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
