//! Evaluate: the evaluation reasoner scores each new child.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::parse::score_or_default;
use crate::stream::PatternEvent;

use super::state::{TreeSearchState, TreeSearchUpdate};
use super::steps::EVALUATE;

pub(super) struct EvaluateNode {
    evaluator: PromptedReasoner,
}

impl EvaluateNode {
    pub(super) fn new(evaluator: PromptedReasoner) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl Node<TreeSearchState> for EvaluateNode {
    fn id(&self) -> &str {
        EVALUATE
    }

    async fn run(&self, state: &TreeSearchState) -> Result<TreeSearchUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    /// Children are scored one at a time, in order; the score is clamped to
    /// `[0, 1]` and defaults to neutral when unparsable.
    async fn run_with_context(
        &self,
        state: &TreeSearchState,
        ctx: &RunContext<TreeSearchState>,
    ) -> Result<TreeSearchUpdate, AgentError> {
        let mut tree = state.tree.get().clone();
        let mut scores = Vec::with_capacity(state.pending.len());
        for &child in state.pending.iter() {
            let (action, child_state) = match tree.get(child) {
                Some(node) => (node.action.clone(), node.state.clone()),
                None => {
                    return Err(AgentError::ExecutionFailed(format!(
                        "pending node {} is not in the tree",
                        child
                    )))
                }
            };
            let parent_path = tree
                .get(child)
                .and_then(|n| n.parent)
                .map(|p| tree.describe_path(&tree.path_to(p)))
                .unwrap_or_default();
            let reply = self
                .evaluator
                .ask(
                    &[
                        ("task", state.task.as_str()),
                        ("path", &parent_path),
                        ("action", &action),
                        ("state", &child_state),
                    ],
                    &ctx.cancel,
                )
                .await?;
            let score = score_or_default(&reply);
            tree.set_evaluation(child, score);
            scores.push(format!("{}={:.2}", child, score));
            ctx.emit_custom(PatternEvent::TreeEvaluated { node: child, score })
                .await;
        }
        Ok(TreeSearchUpdate {
            history: vec![format!("evaluated {}", scores.join(", "))],
            tree: Some(tree),
            ..Default::default()
        })
    }
}
