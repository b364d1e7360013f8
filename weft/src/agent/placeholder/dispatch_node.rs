//! Dispatch: solves every request, wave by wave, substituting values solved
//! in earlier waves into later parameters.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::stream::PatternEvent;
use crate::tools::ToolInvoker;

use super::state::{PlaceholderState, PlaceholderUpdate};
use super::steps::DISPATCH;
use super::template::{resolution_waves, resolve_params};

pub(super) struct DispatchNode {
    invoker: ToolInvoker,
}

impl DispatchNode {
    pub(super) fn new(invoker: ToolInvoker) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl Node<PlaceholderState> for DispatchNode {
    fn id(&self) -> &str {
        DISPATCH
    }

    async fn run(&self, state: &PlaceholderState) -> Result<PlaceholderUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &PlaceholderState,
        ctx: &RunContext<PlaceholderState>,
    ) -> Result<PlaceholderUpdate, AgentError> {
        let requests = state.requests.get();
        let mut solved = state.solved.clone();
        let mut update = PlaceholderUpdate::default();

        for wave in resolution_waves(requests) {
            if ctx.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            let calls = wave
                .iter()
                .map(|&i| &requests[i])
                .filter(|r| !solved.contains_key(&r.placeholder))
                .map(|r| {
                    let params = Value::Object(resolve_params(&r.params, &solved));
                    let cancel = ctx.cancel.clone();
                    async move {
                        let value = self.invoker.execute_or_solve(&r.tool, params, &cancel).await;
                        (r.placeholder.clone(), value)
                    }
                });
            for (placeholder, value) in join_all(calls).await {
                tracing::debug!(placeholder = %placeholder, "placeholder solved");
                ctx.emit_custom(PatternEvent::PlaceholderResolved {
                    placeholder: placeholder.clone(),
                })
                .await;
                solved.insert(placeholder.clone(), value.trim().to_string());
                update.resolution_order.push(placeholder.clone());
                if let Some(v) = solved.get(&placeholder) {
                    update.solved.push((placeholder, v.clone()));
                }
            }
        }
        Ok(update)
    }
}
