//! Dispatch: one tick runs every ready node concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::stream::PatternEvent;
use crate::tools::ToolInvoker;

use super::scheduling::{ready_nodes, resolve_args, unresolved};
use super::state::{DagState, DagUpdate};
use super::steps::DISPATCH;

pub(super) struct DispatchNode {
    invoker: ToolInvoker,
    max_concurrency: usize,
}

impl DispatchNode {
    pub(super) fn new(invoker: ToolInvoker, max_concurrency: usize) -> Self {
        Self {
            invoker,
            max_concurrency: max_concurrency.max(1),
        }
    }
}

#[async_trait]
impl Node<DagState> for DispatchNode {
    fn id(&self) -> &str {
        DISPATCH
    }

    async fn run(&self, state: &DagState) -> Result<DagUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    /// Runs ready nodes with at most `max_concurrency` calls in flight.
    /// Arguments are resolved against results recorded before the tick.
    /// A tick with nothing ready on an incomplete plan fails as stuck.
    async fn run_with_context(
        &self,
        state: &DagState,
        ctx: &RunContext<DagState>,
    ) -> Result<DagUpdate, AgentError> {
        let ready = ready_nodes(&state.nodes, &state.results);
        if ready.is_empty() {
            let waiting = unresolved(&state.nodes, &state.results);
            if waiting.is_empty() {
                return Ok(DagUpdate::default());
            }
            return Err(AgentError::ExecutionFailed(format!(
                "dependency graph is stuck; unresolved nodes: {}",
                waiting.join(", ")
            )));
        }

        let tick = *state.tick + 1;
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut calls = FuturesUnordered::new();
        for (order, node) in ready.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let args = Value::Object(resolve_args(&node.args, &state.results));
            let cancel = ctx.cancel.clone();
            calls.push(async move {
                let output = match semaphore.acquire().await {
                    Ok(_permit) => self.invoker.execute(&node.tool, args, &cancel).await,
                    Err(_) => format!("Error: tool '{}' failed: dispatcher closed", node.tool),
                };
                (order, node.id.clone(), output)
            });
        }

        let mut finished = Vec::new();
        while let Some(done) = calls.next().await {
            tracing::debug!(tick, node = %done.1, "node resolved");
            finished.push(done);
        }
        finished.sort_by_key(|(order, _, _)| *order);
        let executed: Vec<String> = finished.iter().map(|(_, id, _)| id.clone()).collect();
        ctx.emit_custom(PatternEvent::DagTick {
            tick,
            executed: executed.clone(),
        })
        .await;

        Ok(DagUpdate {
            results: finished.into_iter().map(|(_, id, out)| (id, out)).collect(),
            tick: Some(tick),
            executed,
            ..Default::default()
        })
    }
}
