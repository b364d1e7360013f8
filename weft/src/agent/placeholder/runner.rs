//! Placeholder planner graph and runner.
//!
//! Graph: START → plan → dispatch → collect → integrate → END. `integrate` is
//! also the error step.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::agent::prompted::PromptedReasoner;
use crate::agent::{Pattern, PatternDeps, PatternKind};
use crate::graph::{CompiledStateGraph, RunContext, StateGraph, END, START};
use crate::parse::PlaceholderPlan;
use crate::prompts::PLACEHOLDER;
use crate::reasoner::ReasonerRole;
use crate::runner_common::{self, RunError};
use crate::stream::StreamEvent;
use crate::tools::ToolInvoker;

use super::dispatch_node::DispatchNode;
use super::integrate_node::IntegrateNode;
use super::plan_node::PlanNode;
use super::state::PlaceholderState;
use super::steps::{collect_node, COLLECT, DISPATCH, INTEGRATE, PLAN};

/// plan, dispatch, collect, integrate.
const PLACEHOLDER_STEPS: usize = 4;

pub struct PlaceholderRunner {
    compiled: CompiledStateGraph<PlaceholderState>,
}

impl PlaceholderRunner {
    /// Thinking reasoner plans and integrates; requests naming a missing tool
    /// (or `reason`) go to the configured solver role.
    pub fn new(deps: &PatternDeps) -> Result<Self, RunError> {
        let cfg = &deps.config;
        let timeout = cfg.reasoner_timeout();
        let thinking = deps.reasoners.get(ReasonerRole::Thinking);
        let invoker = ToolInvoker::new(Arc::clone(&deps.tools))
            .with_timeout(cfg.call_timeout())
            .with_solver(
                deps.reasoners.get(cfg.placeholder.solver_role),
                deps.prompts.template(PLACEHOLDER, "solve")?,
            );
        let plan = PlanNode::new(
            PromptedReasoner::new(
                Arc::clone(&thinking),
                deps.prompts.template(PLACEHOLDER, "plan")?,
                timeout,
            ),
            Arc::clone(&deps.tools),
        );
        let integrate = IntegrateNode::new(PromptedReasoner::new(
            thinking,
            deps.prompts.template(PLACEHOLDER, "integrate")?,
            timeout,
        ));

        let mut graph = StateGraph::<PlaceholderState>::new().with_error_node(INTEGRATE);
        graph
            .add_node(PLAN, Arc::new(plan))
            .add_node(DISPATCH, Arc::new(DispatchNode::new(invoker)))
            .add_node(COLLECT, Arc::new(collect_node()))
            .add_node(INTEGRATE, Arc::new(integrate))
            .add_edge(START, PLAN)
            .add_edge(PLAN, DISPATCH)
            .add_edge(DISPATCH, COLLECT)
            .add_edge(COLLECT, INTEGRATE)
            .add_edge(INTEGRATE, END);

        let compiled =
            runner_common::configure_graph(graph, &cfg.executor, PLACEHOLDER_STEPS).compile()?;
        Ok(Self { compiled })
    }

    pub async fn invoke(&self, task: &str) -> Result<PlaceholderState, RunError> {
        self.invoke_with_context(task, &RunContext::new()).await
    }

    pub async fn invoke_with_context(
        &self,
        task: &str,
        run_ctx: &RunContext<PlaceholderState>,
    ) -> Result<PlaceholderState, RunError> {
        runner_common::invoke_pattern(&self.compiled, PlaceholderState::new(task), run_ctx).await
    }

    /// Runs a plan supplied by the caller; the planner is not asked.
    pub async fn invoke_plan(
        &self,
        task: &str,
        plan: PlaceholderPlan,
    ) -> Result<PlaceholderState, RunError> {
        runner_common::invoke_pattern(
            &self.compiled,
            PlaceholderState::with_plan(task, plan),
            &RunContext::new(),
        )
        .await
    }

    pub fn stream(&self, task: &str) -> ReceiverStream<StreamEvent<PlaceholderState>> {
        self.compiled.stream(PlaceholderState::new(task), RunContext::new())
    }

    pub async fn stream_with_callback<F>(
        &self,
        task: &str,
        on_event: F,
    ) -> Result<PlaceholderState, RunError>
    where
        F: FnMut(StreamEvent<PlaceholderState>),
    {
        runner_common::run_stream_with_callback(
            &self.compiled,
            PlaceholderState::new(task),
            &RunContext::new(),
            on_event,
        )
        .await
    }
}

#[async_trait]
impl Pattern for PlaceholderRunner {
    fn kind(&self) -> PatternKind {
        PatternKind::Placeholder
    }

    async fn run_with_cancel(
        &self,
        task: &str,
        cancel: CancellationToken,
    ) -> Result<String, RunError> {
        let state = self
            .invoke_with_context(task, &RunContext::new().with_cancel(cancel))
            .await?;
        runner_common::into_answer(state)
    }
}
