//! Plan: the thinking reasoner writes `NODE` blocks; parsed into the task list.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::parse::dag_plan_or_fallback;
use crate::stream::PatternEvent;
use crate::tools::ToolRegistry;

use super::state::{DagState, DagUpdate};
use super::steps::PLAN;

pub(super) struct PlanNode {
    planner: PromptedReasoner,
    tools: Arc<ToolRegistry>,
    max_nodes: usize,
}

impl PlanNode {
    pub(super) fn new(
        planner: PromptedReasoner,
        tools: Arc<ToolRegistry>,
        max_nodes: usize,
    ) -> Self {
        Self {
            planner,
            tools,
            max_nodes,
        }
    }
}

#[async_trait]
impl Node<DagState> for PlanNode {
    fn id(&self) -> &str {
        PLAN
    }

    async fn run(&self, state: &DagState) -> Result<DagUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    /// Keeps a plan supplied up front; otherwise asks the planner. Plans over
    /// `max_nodes` fail the step.
    async fn run_with_context(
        &self,
        state: &DagState,
        ctx: &RunContext<DagState>,
    ) -> Result<DagUpdate, AgentError> {
        let nodes = if state.nodes.is_empty() {
            let tools = self.tools.describe();
            let reply = self
                .planner
                .ask(&[("task", state.task.as_str()), ("tools", &tools)], &ctx.cancel)
                .await?;
            dag_plan_or_fallback(&reply, &state.task)
        } else {
            state.nodes.get().clone()
        };
        if nodes.len() > self.max_nodes {
            return Err(AgentError::ExecutionFailed(format!(
                "plan has {} nodes, limit is {}",
                nodes.len(),
                self.max_nodes
            )));
        }
        let node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        tracing::debug!(nodes = ?node_ids, "dag planned");
        ctx.emit_custom(PatternEvent::DagPlanned { node_ids }).await;
        Ok(DagUpdate {
            nodes: Some(nodes),
            ..Default::default()
        })
    }
}
