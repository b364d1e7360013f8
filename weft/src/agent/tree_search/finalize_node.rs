//! Finalize: answer from the best path, or report the error with it.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};

use super::state::{TreeSearchState, TreeSearchUpdate};
use super::steps::FINALIZE;

pub(super) struct FinalizeNode {
    thinker: PromptedReasoner,
}

impl FinalizeNode {
    pub(super) fn new(thinker: PromptedReasoner) -> Self {
        Self { thinker }
    }
}

/// The path to answer from: the terminal leaf when the search was solved,
/// otherwise the best-average path.
fn answer_path(state: &TreeSearchState) -> Vec<usize> {
    match *state.selected.get() {
        Some(leaf) if *state.solved => state.tree.path_to(leaf),
        _ => state.tree.best_path(),
    }
}

#[async_trait]
impl Node<TreeSearchState> for FinalizeNode {
    fn id(&self) -> &str {
        FINALIZE
    }

    async fn run(&self, state: &TreeSearchState) -> Result<TreeSearchUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &TreeSearchState,
        ctx: &RunContext<TreeSearchState>,
    ) -> Result<TreeSearchUpdate, AgentError> {
        let path = state.tree.describe_path(&answer_path(state));
        if let Some(error) = state.error.as_deref() {
            return Ok(TreeSearchUpdate {
                answer: Some(Some(format!(
                    "Error: {}\n\nBest partial path:\n{}",
                    error, path
                ))),
                ..Default::default()
            });
        }
        let answer = self
            .thinker
            .ask(&[("task", state.task.as_str()), ("path", &path)], &ctx.cancel)
            .await?;
        Ok(TreeSearchUpdate {
            answer: Some(Some(answer.trim().to_string())),
            history: vec![format!("finalized after {} cycles", *state.iteration)],
            ..Default::default()
        })
    }
}
