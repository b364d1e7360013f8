//! Integrate: polish the filled plan into the answer, or report the error.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};

use super::state::{PlaceholderState, PlaceholderUpdate};
use super::steps::INTEGRATE;

pub(super) struct IntegrateNode {
    writer: PromptedReasoner,
}

impl IntegrateNode {
    pub(super) fn new(writer: PromptedReasoner) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Node<PlaceholderState> for IntegrateNode {
    fn id(&self) -> &str {
        INTEGRATE
    }

    async fn run(&self, state: &PlaceholderState) -> Result<PlaceholderUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &PlaceholderState,
        ctx: &RunContext<PlaceholderState>,
    ) -> Result<PlaceholderUpdate, AgentError> {
        let plan = state.current_fill();
        let values = state.format_solved();
        if let Some(error) = state.error.as_deref() {
            return Ok(PlaceholderUpdate {
                answer: Some(Some(format!(
                    "Error: {}\n\nPartially filled plan:\n{}\n\nValues:\n{}",
                    error, plan, values
                ))),
                ..Default::default()
            });
        }
        let answer = self
            .writer
            .ask(
                &[("task", state.task.as_str()), ("plan", &plan), ("results", &values)],
                &ctx.cancel,
            )
            .await?;
        Ok(PlaceholderUpdate {
            answer: Some(Some(answer.trim().to_string())),
            ..Default::default()
        })
    }
}
