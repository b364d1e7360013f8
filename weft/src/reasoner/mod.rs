//! Reasoner: the abstraction over one LLM call.
//!
//! `invoke(system, user) -> text`. Provider wiring and credentials live outside
//! this crate; implement [`Reasoner`] over any client. Steps pick a reasoner by
//! [`ReasonerRole`] from a [`Reasoners`] set and call it through
//! [`call_reasoner`], which adds the per-call timeout and cancellation.

mod guard;
mod mock;
mod role;

pub use guard::call_reasoner;
pub use mock::MockReasoner;
pub use role::{ReasonerRole, Reasoners};

use async_trait::async_trait;

use crate::error::AgentError;

/// One text-in, text-out reasoning call.
///
/// **Interaction**: Implemented by provider clients and [`MockReasoner`]; called
/// by pattern steps and by the tool invoker's solver fallback.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Sends `system` and `user` prompts and returns the response text.
    ///
    /// Provider faults are reported as [`AgentError::Reasoner`].
    async fn invoke(&self, system: &str, user: &str) -> Result<String, AgentError>;
}
