//! Executor outcomes that are not step faults.
//!
//! Step failures never appear here: they are written into `state.error`. A
//! `GraphError` means the run loop itself stopped early; the state passed to
//! `CompiledStateGraph::run` still holds everything merged so far.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// The executor step ceiling was reached before a terminal transition.
    #[error("step budget of {max_steps} exhausted before reaching END (last node: {last_node})")]
    BudgetExhausted { max_steps: usize, last_node: String },

    /// The run's cancellation token fired between steps.
    #[error("graph run cancelled")]
    Cancelled,

    /// The graph has no entry step (only possible for hand-built graphs).
    #[error("empty graph")]
    EmptyGraph,
}
