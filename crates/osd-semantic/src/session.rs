//! Per-call store for cross-rule dependency values
//!
//! While a rule tree is walked, every evaluated field value is recorded
//! here so later sibling rules declaring a `dependency_key` can bind it.
//! The store is created inside each top-level validation call and
//! threaded through by mutable reference, so concurrent validations can
//! never observe each other's values.

use serde_json::Value;
use std::collections::HashMap;

/// Key/value store scoped to one validation call
#[derive(Debug, Default)]
pub struct SessionStore {
    values: HashMap<String, Value>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field value under its field name
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Look up a previously recorded value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Drop all recorded values
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
