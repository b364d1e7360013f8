//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown steps, the
//! entry is missing or ambiguous, or a step has no way out.

use thiserror::Error;

/// Error when compiling a state graph. Cycles are allowed and not reported.
#[derive(Debug, Error, PartialEq)]
pub enum CompilationError {
    /// A step id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START, or more than one such edge.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Nothing can reach END: no edge to END and no router that may return it.
    #[error("graph has no path to END")]
    MissingEnd,

    /// A step has two outgoing static edges.
    #[error("node has more than one outgoing edge: {0}")]
    DuplicateEdge(String),

    /// A step has neither an outgoing edge nor conditional edges.
    #[error("node has no outgoing edge: {0}")]
    NoOutgoingEdge(String),

    /// A step has both an outgoing edge and conditional edges.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A value in a conditional path_map is not a valid step id or END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),

    /// The error step set with `with_error_node` is not registered.
    #[error("error node not found: {0}")]
    ErrorNodeNotFound(String),

    /// The executor step ceiling must be at least 1.
    #[error("max_steps must be at least 1")]
    ZeroStepBudget,
}
