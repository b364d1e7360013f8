//! Topic channel: accumulating list, updates are appended and never replace.

use super::{Channel, MergePolicy};

/// Append-only list channel (e.g. a step history).
#[derive(Debug, Clone, PartialEq)]
pub struct Topic<T> {
    values: Vec<T>,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> Topic<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T> Channel for Topic<T> {
    type Update = Vec<T>;
    const POLICY: MergePolicy = MergePolicy::Append;

    fn apply(&mut self, update: Vec<T>) {
        self.values.extend(update);
    }
}
