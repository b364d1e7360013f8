//! Step execution error types.
//!
//! Returned by `Node::run` and by reasoner calls. The graph executor never lets
//! these cross `invoke`: it writes them into the state's `error` field and routes
//! to the error step.

use std::time::Duration;

use thiserror::Error;

/// Error raised by a single step (node) or by a reasoner call inside it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    /// Execution failed with a message (e.g. invalid state, bug in a step).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The reasoner (LLM provider) call failed.
    #[error("reasoner failed: {0}")]
    Reasoner(String),

    /// A reasoner call did not finish within its deadline.
    #[error("reasoner timed out after {0:?}")]
    Timeout(Duration),

    /// The run was cancelled through its cancellation token.
    #[error("cancelled")]
    Cancelled,
}

impl AgentError {
    /// True for failures that may succeed when the step is retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, AgentError::Reasoner(_) | AgentError::Timeout(_))
    }
}
