//! Synthesize: answer from the id / tool / result triples, or report the error.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};

use super::state::{DagState, DagUpdate};
use super::steps::SYNTHESIZE;

pub(super) struct SynthesizeNode {
    writer: PromptedReasoner,
}

impl SynthesizeNode {
    pub(super) fn new(writer: PromptedReasoner) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Node<DagState> for SynthesizeNode {
    fn id(&self) -> &str {
        SYNTHESIZE
    }

    async fn run(&self, state: &DagState) -> Result<DagUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &DagState,
        ctx: &RunContext<DagState>,
    ) -> Result<DagUpdate, AgentError> {
        let results = state.format_results();
        if let Some(error) = state.error.as_deref() {
            return Ok(DagUpdate {
                answer: Some(Some(format!("Error: {}\n\nPartial results:\n{}", error, results))),
                ..Default::default()
            });
        }
        let answer = self
            .writer
            .ask(&[("task", state.task.as_str()), ("results", &results)], &ctx.cancel)
            .await?;
        Ok(DagUpdate {
            answer: Some(Some(answer.trim().to_string())),
            ..Default::default()
        })
    }
}
