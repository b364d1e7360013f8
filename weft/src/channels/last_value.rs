//! LastValue channel: scalar field, each update replaces the value.

use std::ops::Deref;

use super::{Channel, MergePolicy};

/// Scalar channel. `None` in the update means "unchanged".
///
/// ```rust
/// use weft::channels::{Channel, LastValue};
///
/// let mut iteration = LastValue::new(0usize);
/// iteration.apply(Some(3));
/// iteration.apply(None);
/// assert_eq!(*iteration, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastValue<T> {
    value: T,
}

impl<T> LastValue<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for LastValue<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Channel for LastValue<T> {
    type Update = Option<T>;
    const POLICY: MergePolicy = MergePolicy::Replace;

    fn apply(&mut self, update: Option<T>) {
        if let Some(value) = update {
            self.value = value;
        }
    }
}
