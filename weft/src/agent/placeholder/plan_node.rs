//! Plan: the thinking reasoner writes an answer template and solver requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::parse::placeholder_plan_or_fallback;
use crate::tools::ToolRegistry;

use super::state::{PlaceholderState, PlaceholderUpdate};
use super::steps::PLAN;
use super::template::PlanTemplate;

pub(super) struct PlanNode {
    planner: PromptedReasoner,
    tools: Arc<ToolRegistry>,
}

impl PlanNode {
    pub(super) fn new(planner: PromptedReasoner, tools: Arc<ToolRegistry>) -> Self {
        Self { planner, tools }
    }
}

#[async_trait]
impl Node<PlaceholderState> for PlanNode {
    fn id(&self) -> &str {
        PLAN
    }

    async fn run(&self, state: &PlaceholderState) -> Result<PlaceholderUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &PlaceholderState,
        ctx: &RunContext<PlaceholderState>,
    ) -> Result<PlaceholderUpdate, AgentError> {
        if !state.template.is_empty() {
            return Ok(PlaceholderUpdate::default());
        }
        let tools = self.tools.describe();
        let reply = self
            .planner
            .ask(&[("task", state.task.as_str()), ("tools", &tools)], &ctx.cancel)
            .await?;
        let plan = placeholder_plan_or_fallback(&reply, &state.task);
        tracing::debug!(
            template = %plan.template,
            requests = plan.requests.len(),
            "placeholder plan"
        );
        Ok(PlaceholderUpdate {
            template: Some(PlanTemplate::new(plan.template)),
            requests: Some(plan.requests),
            ..Default::default()
        })
    }
}
