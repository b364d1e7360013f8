//! Node middleware: wrap every step with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::StateRecord;

/// The wrapped step: takes an owned snapshot of the state.
pub type NodeFuture<S> =
    Pin<Box<dyn Future<Output = Result<<S as StateRecord>::Update, AgentError>> + Send>>;

pub type InnerRun<S> = Box<dyn FnOnce(S) -> NodeFuture<S> + Send>;

/// Async middleware around each step run. Must call `inner` to execute the step.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: StateRecord,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: InnerRun<S>,
    ) -> Result<S::Update, AgentError>;
}
