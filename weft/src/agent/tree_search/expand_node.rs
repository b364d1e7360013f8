//! Expand: the thinking reasoner proposes children for the selected leaf.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::parse::expansions_or_fallback;
use crate::stream::PatternEvent;

use super::state::{TreeSearchState, TreeSearchUpdate};
use super::steps::EXPAND;

pub(super) struct ExpandNode {
    thinker: PromptedReasoner,
    num_expansions: usize,
}

impl ExpandNode {
    pub(super) fn new(thinker: PromptedReasoner, num_expansions: usize) -> Self {
        Self {
            thinker,
            num_expansions,
        }
    }
}

#[async_trait]
impl Node<TreeSearchState> for ExpandNode {
    fn id(&self) -> &str {
        EXPAND
    }

    async fn run(&self, state: &TreeSearchState) -> Result<TreeSearchUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &TreeSearchState,
        ctx: &RunContext<TreeSearchState>,
    ) -> Result<TreeSearchUpdate, AgentError> {
        let leaf = state
            .selected
            .ok_or_else(|| AgentError::ExecutionFailed("no leaf selected".into()))?;
        let path = state.tree.describe_path(&state.tree.path_to(leaf));
        let limit = self.num_expansions.to_string();
        let reply = self
            .thinker
            .ask(
                &[
                    ("task", state.task.as_str()),
                    ("path", &path),
                    ("num_expansions", &limit),
                ],
                &ctx.cancel,
            )
            .await?;

        let mut tree = state.tree.get().clone();
        let children: Vec<usize> = expansions_or_fallback(&reply, self.num_expansions)
            .into_iter()
            .filter_map(|e| tree.add_child(leaf, e.action, e.state, e.terminal))
            .collect();
        tracing::debug!(leaf, children = ?children, "expanded");
        ctx.emit_custom(PatternEvent::TreeExpanded {
            parent: leaf,
            children: children.clone(),
        })
        .await;

        Ok(TreeSearchUpdate {
            history: vec![format!("expanded {} into {:?}", leaf, children)],
            tree: Some(tree),
            pending: Some(children),
            ..Default::default()
        })
    }
}
