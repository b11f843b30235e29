//! # Annotations
//!
//! String-keyed side data attached to graphs, nodes, edge types and edges.
//!
//! Payloads are stored as `serde_json::Value`, so any `Serialize` type can be
//! attached and read back with its own type. Annotations are copied by value
//! on every clone, serialize and deserialize path.

use crate::IHGraphError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered annotation map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, Value>);

impl Annotations {
    /// Create an empty annotation map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` and store it under `key`, replacing any previous payload.
    pub fn create<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), IHGraphError> {
        let value = serde_json::to_value(value)?;
        self.0.insert(key.into(), value);
        Ok(())
    }

    /// Store a raw JSON payload under `key`.
    pub fn set_raw(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Store a string payload under `key`.
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    /// Read the payload under `key` as `T`.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the
    /// payload does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, IHGraphError> {
        match self.0.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Raw payload under `key`.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Payload under `key` if it is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove and return the payload under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Copy every entry into `target`, overwriting entries with the same key.
    pub fn clone_to(&self, target: &mut Annotations) {
        for (key, value) in &self.0 {
            target.0.insert(key.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Span {
        line: u32,
        column: u32,
    }

    #[test]
    fn typed_payload_round_trips() {
        let mut annotations = Annotations::new();
        annotations
            .create("span", &Span { line: 3, column: 9 })
            .expect("create");

        let span: Option<Span> = annotations.get("span").expect("get");
        assert_eq!(span, Some(Span { line: 3, column: 9 }));
    }

    #[test]
    fn missing_key_is_none() {
        let annotations = Annotations::new();
        let value: Option<String> = annotations.get("absent").expect("get");
        assert!(value.is_none());
        assert!(!annotations.has("absent"));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let mut annotations = Annotations::new();
        annotations.set_str("count", "three");
        let result: Result<Option<u32>, _> = annotations.get("count");
        assert!(matches!(result, Err(IHGraphError::SerializationError(_))));
    }

    #[test]
    fn clone_to_overwrites_and_keeps_others() {
        let mut source = Annotations::new();
        source.set_str("a", "new");

        let mut target = Annotations::new();
        target.set_str("a", "old");
        target.set_str("b", "kept");

        source.clone_to(&mut target);
        assert_eq!(target.get_str("a"), Some("new"));
        assert_eq!(target.get_str("b"), Some("kept"));
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn remove_and_clear() {
        let mut annotations = Annotations::new();
        annotations.set_raw("x", Value::from(1));
        annotations.set_raw("y", Value::from(2));

        assert_eq!(annotations.remove("x"), Some(Value::from(1)));
        annotations.clear();
        assert!(annotations.is_empty());
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut annotations = Annotations::new();
        annotations.set_str("k", "v");
        let json = serde_json::to_string(&annotations).expect("serialize");
        assert_eq!(json, r#"{"k":"v"}"#);
    }
}
