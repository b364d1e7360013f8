//! Trial loop graph and runner.
//!
//! Graph: START → attempt → evaluate → [passed or out of trials?] → finalize |
//! reflect → attempt. `finalize` is also the error step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::agent::prompted::PromptedReasoner;
use crate::agent::{Pattern, PatternDeps, PatternKind};
use crate::graph::{CompiledStateGraph, RunContext, StateGraph, END, START};
use crate::prompts::REFLEXION;
use crate::reasoner::{Reasoner, ReasonerRole};
use crate::runner_common::{self, RunError};
use crate::stream::StreamEvent;

use super::nodes::{AttemptNode, EvaluateNode, ReflectNode};
use super::state::ReflexionState;
use super::steps::{finalize_node, route_after_evaluate, ATTEMPT, EVALUATE, FINALIZE, REFLECT};

pub struct ReflexionRunner {
    compiled: CompiledStateGraph<ReflexionState>,
}

impl ReflexionRunner {
    /// Thinking reasoner attempts and reflects; the evaluation role judges.
    pub fn new(deps: &PatternDeps) -> Result<Self, RunError> {
        let cfg = &deps.config;
        let timeout = cfg.reasoner_timeout();
        let thinking = deps.reasoners.get(ReasonerRole::Thinking);
        let prompted = |reasoner: Arc<dyn Reasoner>, step: &str| -> Result<PromptedReasoner, RunError> {
            Ok(PromptedReasoner::new(
                reasoner,
                deps.prompts.template(REFLEXION, step)?,
                timeout,
            ))
        };
        let attempt = AttemptNode::new(prompted(Arc::clone(&thinking), "attempt")?);
        let evaluate = EvaluateNode::new(prompted(
            deps.reasoners.get(ReasonerRole::Evaluation),
            "evaluate",
        )?);
        let reflect = ReflectNode::new(prompted(thinking, "reflect")?);

        let path_map: HashMap<String, String> = [
            (REFLECT.to_string(), REFLECT.to_string()),
            (FINALIZE.to_string(), FINALIZE.to_string()),
        ]
        .into_iter()
        .collect();
        let mut graph = StateGraph::<ReflexionState>::new().with_error_node(FINALIZE);
        graph
            .add_node(ATTEMPT, Arc::new(attempt))
            .add_node(EVALUATE, Arc::new(evaluate))
            .add_node(REFLECT, Arc::new(reflect))
            .add_node(FINALIZE, Arc::new(finalize_node()))
            .add_edge(START, ATTEMPT)
            .add_edge(ATTEMPT, EVALUATE)
            .add_conditional_edges(
                EVALUATE,
                Arc::new(route_after_evaluate(cfg.trials.max_trials.max(1))),
                Some(path_map),
            )
            .add_edge(REFLECT, ATTEMPT)
            .add_edge(FINALIZE, END);

        let compiled =
            runner_common::configure_graph(graph, &cfg.executor, cfg.trials.budget_steps()).compile()?;
        Ok(Self { compiled })
    }

    pub async fn invoke(&self, task: &str) -> Result<ReflexionState, RunError> {
        self.invoke_with_context(task, &RunContext::new()).await
    }

    pub async fn invoke_with_context(
        &self,
        task: &str,
        run_ctx: &RunContext<ReflexionState>,
    ) -> Result<ReflexionState, RunError> {
        runner_common::invoke_pattern(&self.compiled, ReflexionState::new(task), run_ctx).await
    }

    pub fn stream(&self, task: &str) -> ReceiverStream<StreamEvent<ReflexionState>> {
        self.compiled.stream(ReflexionState::new(task), RunContext::new())
    }

    pub async fn stream_with_callback<F>(
        &self,
        task: &str,
        on_event: F,
    ) -> Result<ReflexionState, RunError>
    where
        F: FnMut(StreamEvent<ReflexionState>),
    {
        runner_common::run_stream_with_callback(
            &self.compiled,
            ReflexionState::new(task),
            &RunContext::new(),
            on_event,
        )
        .await
    }
}

#[async_trait]
impl Pattern for ReflexionRunner {
    fn kind(&self) -> PatternKind {
        PatternKind::Reflexion
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
