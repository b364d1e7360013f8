//! DAG graph and runner.
//!
//! Graph: START → plan → dispatch → check_completion → [done?] → dispatch |
//! synthesize → END. `synthesize` is also the error step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::agent::prompted::PromptedReasoner;
use crate::agent::{Pattern, PatternDeps, PatternKind};
use crate::graph::{CompiledStateGraph, RunContext, StateGraph, END, START};
use crate::parse::TaskNode;
use crate::prompts::DAG;
use crate::reasoner::ReasonerRole;
use crate::runner_common::{self, RunError};
use crate::stream::StreamEvent;
use crate::tools::ToolInvoker;

use super::dispatch_node::DispatchNode;
use super::plan_node::PlanNode;
use super::state::DagState;
use super::steps::{
    check_completion_node, route_after_check, CHECK_COMPLETION, DISPATCH, PLAN, SYNTHESIZE,
};
use super::synthesize_node::SynthesizeNode;

pub struct DagRunner {
    compiled: CompiledStateGraph<DagState>,
}

impl DagRunner {
    /// Thinking reasoner plans and synthesizes; `reason` nodes go to the
    /// configured solver role.
    pub fn new(deps: &PatternDeps) -> Result<Self, RunError> {
        let cfg = &deps.config;
        let timeout = cfg.reasoner_timeout();
        let thinking = deps.reasoners.get(ReasonerRole::Thinking);
        let invoker = ToolInvoker::new(Arc::clone(&deps.tools))
            .with_timeout(cfg.call_timeout())
            .with_solver(
                deps.reasoners.get(cfg.placeholder.solver_role),
                deps.prompts.template(DAG, "solve")?,
            );
        let plan = PlanNode::new(
            PromptedReasoner::new(
                Arc::clone(&thinking),
                deps.prompts.template(DAG, "plan")?,
                timeout,
            ),
            Arc::clone(&deps.tools),
            cfg.dag.max_nodes,
        );
        let synthesize = SynthesizeNode::new(PromptedReasoner::new(
            thinking,
            deps.prompts.template(DAG, "synthesize")?,
            timeout,
        ));

        let path_map: HashMap<String, String> = [
            (DISPATCH.to_string(), DISPATCH.to_string()),
            (SYNTHESIZE.to_string(), SYNTHESIZE.to_string()),
        ]
        .into_iter()
        .collect();
        let mut graph = StateGraph::<DagState>::new().with_error_node(SYNTHESIZE);
        graph
            .add_node(PLAN, Arc::new(plan))
            .add_node(DISPATCH, Arc::new(DispatchNode::new(invoker, cfg.dag.max_concurrency)))
            .add_node(CHECK_COMPLETION, Arc::new(check_completion_node()))
            .add_node(SYNTHESIZE, Arc::new(synthesize))
            .add_edge(START, PLAN)
            .add_edge(PLAN, DISPATCH)
            .add_edge(DISPATCH, CHECK_COMPLETION)
            .add_conditional_edges(CHECK_COMPLETION, Arc::new(route_after_check), Some(path_map))
            .add_edge(SYNTHESIZE, END);

        let compiled =
            runner_common::configure_graph(graph, &cfg.executor, cfg.dag.budget_steps()).compile()?;
        Ok(Self { compiled })
    }

    pub async fn invoke(&self, task: &str) -> Result<DagState, RunError> {
        self.invoke_with_context(task, &RunContext::new()).await
    }

    pub async fn invoke_with_context(
        &self,
        task: &str,
        run_ctx: &RunContext<DagState>,
    ) -> Result<DagState, RunError> {
        runner_common::invoke_pattern(&self.compiled, DagState::new(task), run_ctx).await
    }

    /// Runs a plan supplied by the caller; the planner is not asked.
    pub async fn invoke_plan(
        &self,
        task: &str,
        nodes: Vec<TaskNode>,
    ) -> Result<DagState, RunError> {
        runner_common::invoke_pattern(
            &self.compiled,
            DagState::with_plan(task, nodes),
            &RunContext::new(),
        )
        .await
    }

    pub fn stream(&self, task: &str) -> ReceiverStream<StreamEvent<DagState>> {
        self.compiled.stream(DagState::new(task), RunContext::new())
    }

    pub async fn stream_with_callback<F>(&self, task: &str, on_event: F) -> Result<DagState, RunError>
    where
        F: FnMut(StreamEvent<DagState>),
    {
        runner_common::run_stream_with_callback(
            &self.compiled,
            DagState::new(task),
            &RunContext::new(),
            on_event,
        )
        .await
    }
}

#[async_trait]
impl Pattern for DagRunner {
    fn kind(&self) -> PatternKind {
        PatternKind::Dag
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
