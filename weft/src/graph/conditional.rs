//! Conditional edges: route to the next step based on state.
//!
//! A source step has a pure routing function `(state) -> label`; the label is
//! looked up in an optional path map, otherwise used as the step id itself.
//!
//! **Interaction**: Built by `StateGraph::add_conditional_edges`, resolved by the
//! `CompiledStateGraph` run loop after the source step's update is merged.

use std::collections::HashMap;
use std::sync::Arc;

/// Router function: reads state, returns a transition label.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Routing function plus optional label → step id map.
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> Clone for ConditionalRouter<S> {
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            path_map: self.path_map.clone(),
        }
    }
}

impl<S> ConditionalRouter<S> {
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next step id (or END) from the current state.
    ///
    /// The result is not validated here; the executor treats an unknown id as
    /// a step failure.
    pub fn resolve_next(&self, state: &S) -> String {
        let label = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&label))
            .cloned()
            .unwrap_or(label)
    }
}

/// How to determine the step after a given step.
pub enum NextEntry<S> {
    /// Single fixed next step (or END).
    Unconditional(String),
    /// Next step decided by the router from state.
    Conditional(ConditionalRouter<S>),
}

impl<S> Clone for NextEntry<S> {
    fn clone(&self) -> Self {
        match self {
            NextEntry::Unconditional(id) => NextEntry::Unconditional(id.clone()),
            NextEntry::Conditional(r) => NextEntry::Conditional(r.clone()),
        }
    }
}
