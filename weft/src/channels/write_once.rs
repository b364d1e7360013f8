//! WriteOnceMap channel: keyed results where every key is assigned at most once.
//!
//! Used for DAG task results and resolved placeholders. A second write to an
//! existing key is dropped (and logged), so readers never observe an
//! overwritten result.

use std::collections::BTreeMap;

use super::{Channel, MergePolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOnceMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> Default for WriteOnceMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> WriteOnceMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, V> {
        &self.entries
    }

    /// Inserts `value` under `key` unless the key is already set.
    ///
    /// Returns `false` when the write was rejected.
    pub fn insert(&mut self, key: String, value: V) -> bool {
        if self.entries.contains_key(&key) {
            tracing::warn!(key = %key, "write-once slot already set; dropping second write");
            return false;
        }
        self.entries.insert(key, value);
        true
    }
}

impl<V> Channel for WriteOnceMap<V> {
    type Update = Vec<(String, V)>;
    const POLICY: MergePolicy = MergePolicy::WriteOnce;

    fn apply(&mut self, update: Vec<(String, V)>) {
        for (key, value) in update {
            self.insert(key, value);
        }
    }
}
