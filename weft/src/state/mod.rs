//! State record contract shared by the graph executor and every pattern.
//!
//! A state is a struct of [channels](crate::channels); its companion update type
//! carries one optional partial value per field. Steps return updates, the
//! executor is the only writer and calls [`StateRecord::merge`].
//!
//! The reserved `error` field drives fast-forward routing: once set, the
//! executor jumps to the graph's error step (see
//! [`StateGraph::with_error_node`](crate::graph::StateGraph::with_error_node)).

use std::fmt::Debug;

/// A typed state record with per-field merge policy.
pub trait StateRecord: Clone + Send + Sync + Debug + 'static {
    /// Partial update returned by steps. `Default` is the empty update.
    type Update: Default + Send + Debug + 'static;

    /// Merges `update` into `self` field by field.
    fn merge(&mut self, update: Self::Update);

    /// The recorded error, if any.
    fn error(&self) -> Option<&str>;

    /// Records an error. Called by the executor when a step fails or a router
    /// names an unknown step.
    fn set_error(&mut self, message: String);
}
