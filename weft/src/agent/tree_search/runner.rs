//! Tree search graph and runner.
//!
//! Graph: START → select → [solved?] → expand → evaluate → backpropagate →
//! check_budget → [exhausted?] → select | finalize → END. `finalize` is also
//! the error step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::agent::prompted::PromptedReasoner;
use crate::agent::{Pattern, PatternDeps, PatternKind};
use crate::graph::{CompiledStateGraph, RunContext, StateGraph, END, START};
use crate::prompts::TREE_SEARCH;
use crate::reasoner::ReasonerRole;
use crate::runner_common::{self, RunError};
use crate::stream::StreamEvent;

use super::evaluate_node::EvaluateNode;
use super::expand_node::ExpandNode;
use super::finalize_node::FinalizeNode;
use super::state::TreeSearchState;
use super::steps::{
    backpropagate_node, check_budget_node, route_after_budget, route_after_select, select_node,
    BACKPROPAGATE, CHECK_BUDGET, EVALUATE, EXPAND, FINALIZE, SELECT,
};

pub struct TreeSearchRunner {
    compiled: CompiledStateGraph<TreeSearchState>,
}

impl TreeSearchRunner {
    /// Thinking reasoner expands and finalizes; evaluation reasoner scores.
    pub fn new(deps: &PatternDeps) -> Result<Self, RunError> {
        let cfg = &deps.config;
        let timeout = cfg.reasoner_timeout();
        let thinking = deps.reasoners.get(ReasonerRole::Thinking);
        let expand = ExpandNode::new(
            PromptedReasoner::new(
                Arc::clone(&thinking),
                deps.prompts.template(TREE_SEARCH, "expand")?,
                timeout,
            ),
            cfg.tree_search.num_expansions,
        );
        let evaluate = EvaluateNode::new(PromptedReasoner::new(
            deps.reasoners.get(ReasonerRole::Evaluation),
            deps.prompts.template(TREE_SEARCH, "evaluate")?,
            timeout,
        ));
        let finalize = FinalizeNode::new(PromptedReasoner::new(
            thinking,
            deps.prompts.template(TREE_SEARCH, "finalize")?,
            timeout,
        ));

        let mut graph = StateGraph::<TreeSearchState>::new().with_error_node(FINALIZE);
        let after_select: HashMap<String, String> = [
            (EXPAND.to_string(), EXPAND.to_string()),
            (FINALIZE.to_string(), FINALIZE.to_string()),
        ]
        .into_iter()
        .collect();
        let after_budget: HashMap<String, String> = [
            (SELECT.to_string(), SELECT.to_string()),
            (FINALIZE.to_string(), FINALIZE.to_string()),
        ]
        .into_iter()
        .collect();
        graph
            .add_node(SELECT, Arc::new(select_node(cfg.tree_search.exploration_weight)))
            .add_node(EXPAND, Arc::new(expand))
            .add_node(EVALUATE, Arc::new(evaluate))
            .add_node(BACKPROPAGATE, Arc::new(backpropagate_node()))
            .add_node(CHECK_BUDGET, Arc::new(check_budget_node(cfg.tree_search.max_iterations)))
            .add_node(FINALIZE, Arc::new(finalize))
            .add_edge(START, SELECT)
            .add_conditional_edges(SELECT, Arc::new(route_after_select), Some(after_select))
            .add_edge(EXPAND, EVALUATE)
            .add_edge(EVALUATE, BACKPROPAGATE)
            .add_edge(BACKPROPAGATE, CHECK_BUDGET)
            .add_conditional_edges(CHECK_BUDGET, Arc::new(route_after_budget), Some(after_budget))
            .add_edge(FINALIZE, END);

        let compiled =
            runner_common::configure_graph(graph, &cfg.executor, cfg.tree_search.budget_steps()).compile()?;
        Ok(Self { compiled })
    }

    pub async fn invoke(&self, task: &str) -> Result<TreeSearchState, RunError> {
        self.invoke_with_context(task, &RunContext::new()).await
    }

    pub async fn invoke_with_context(
        &self,
        task: &str,
        run_ctx: &RunContext<TreeSearchState>,
    ) -> Result<TreeSearchState, RunError> {
        runner_common::invoke_pattern(&self.compiled, TreeSearchState::new(task), run_ctx).await
    }

    /// Streams step and tree events; the last `Updates` event holds the final
    /// state and `Done` reports how the run ended.
    pub fn stream(&self, task: &str) -> ReceiverStream<StreamEvent<TreeSearchState>> {
        self.compiled
            .stream(TreeSearchState::new(task), RunContext::new())
    }

    pub async fn stream_with_callback<F>(
        &self,
        task: &str,
        on_event: F,
    ) -> Result<TreeSearchState, RunError>
    where
        F: FnMut(StreamEvent<TreeSearchState>),
    {
        runner_common::run_stream_with_callback(
            &self.compiled,
            TreeSearchState::new(task),
            &RunContext::new(),
            on_event,
        )
        .await
    }
}

#[async_trait]
impl Pattern for TreeSearchRunner {
    fn kind(&self) -> PatternKind {
        PatternKind::TreeSearch
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
