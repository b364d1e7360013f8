//! Graph node trait: one named step in a StateGraph.
//!
//! Receives the current state by reference and returns a partial update
//! (`S::Update`). Nodes never mutate state; the executor merges the update.
//! Routing is not the node's concern: edges and conditional routers decide
//! the next step.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::StateRecord;

use super::RunContext;

/// One step in a graph: state in, partial update out.
///
/// **Interaction**: Registered with `StateGraph::add_node`; run by
/// `CompiledStateGraph` (through retry and optional middleware).
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: StateRecord,
{
    /// Node id (e.g. `"select"`, `"dispatch"`). Unique within a graph.
    fn id(&self) -> &str;

    /// One step without run context.
    async fn run(&self, state: &S) -> Result<S::Update, AgentError>;

    /// Variant with run context (cancellation, streaming).
    ///
    /// Default implementation calls `run` and ignores the context. Nodes that
    /// call a reasoner or tool override this to honour cancellation.
    async fn run_with_context(
        &self,
        state: &S,
        _ctx: &RunContext<S>,
    ) -> Result<S::Update, AgentError> {
        self.run(state).await
    }
}
