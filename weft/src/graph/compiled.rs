//! Compiled state graph: the cyclic executor every pattern runs on.
//!
//! Built by `StateGraph::compile`. The run loop:
//!
//! 1. look up the current step and run it (retry policy and middleware applied);
//! 2. merge its update into state, or write its failure into `state.error`;
//! 3. if `state.error` is set, jump once to the error step and stop after it;
//! 4. otherwise follow the static edge or the conditional router;
//! 5. stop at `END`.
//!
//! A step ceiling (`max_steps`) bounds the loop regardless of router behaviour,
//! and the run context's cancellation token is checked before every step.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::state::StateRecord;
use crate::stream::StreamEvent;

use super::conditional::NextEntry;
use super::graph_error::GraphError;
use super::logging::{
    log_error_routed, log_graph_complete, log_graph_error, log_graph_start, log_node_complete,
    log_node_start, log_node_state, log_state_update,
};
use super::node::Node;
use super::node_middleware::{NodeFuture, NodeMiddleware};
use super::retry::RetryPolicy;
use super::run_context::RunContext;
use super::state_graph::END;

/// Compiled graph: immutable structure, run with `invoke`, `run` or `stream`.
pub struct CompiledStateGraph<S: StateRecord> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) retry_policy: RetryPolicy,
    pub(super) error_node: Option<String>,
    pub(super) max_steps: usize,
}

impl<S: StateRecord> Clone for CompiledStateGraph<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            first_node_id: self.first_node_id.clone(),
            next_map: self.next_map.clone(),
            middleware: self.middleware.clone(),
            retry_policy: self.retry_policy.clone(),
            error_node: self.error_node.clone(),
            max_steps: self.max_steps,
        }
    }
}

impl<S: StateRecord> CompiledStateGraph<S> {
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn error_node(&self) -> Option<&str> {
        self.error_node.as_deref()
    }

    /// Runs one step, retrying transient failures per the retry policy.
    async fn execute_node_with_retry(
        &self,
        node: Arc<dyn Node<S>>,
        state: &S,
        run_ctx: &RunContext<S>,
    ) -> Result<S::Update, AgentError> {
        let mut attempt = 0;
        loop {
            let result = match &self.middleware {
                Some(middleware) => {
                    let node_id = node.id().to_string();
                    let node_inner = Arc::clone(&node);
                    let ctx_inner = run_ctx.clone();
                    middleware
                        .around_run(
                            &node_id,
                            state.clone(),
                            Box::new(move |s: S| -> NodeFuture<S> {
                                Box::pin(async move {
                                    node_inner.run_with_context(&s, &ctx_inner).await
                                })
                            }),
                        )
                        .await
                }
                None => node.run_with_context(state, run_ctx).await,
            };

            match result {
                Err(e) if e.is_transient() && self.retry_policy.should_retry(attempt) => {
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(node_id = node.id(), attempt, error = %e, "retrying node");
                    if delay > std::time::Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Resolves where to go after `current_id`. `None` means END.
    fn route(&self, current_id: &str, state: &S) -> Option<String> {
        let target = match self.next_map.get(current_id) {
            Some(NextEntry::Unconditional(to)) => to.clone(),
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state);
                tracing::debug!(from = %current_id, to = %target, "conditional routing");
                target
            }
            None => END.to_string(),
        };
        (target != END).then_some(target)
    }

    /// The run loop. Leaves all merged progress in `state`, also on `Err`.
    ///
    /// Step failures and unknown routing targets are recorded in `state.error`
    /// and never returned; `Err` is only returned when the step ceiling is hit
    /// or the run is cancelled.
    pub async fn run(&self, state: &mut S, run_ctx: &RunContext<S>) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&self.first_node_id) {
            return Err(GraphError::EmptyGraph);
        }
        log_graph_start(&self.first_node_id, self.max_steps);

        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        let mut on_error_path = false;

        loop {
            if state.error().is_some() && !on_error_path {
                on_error_path = true;
                log_error_routed(
                    &current_id,
                    self.error_node.as_deref(),
                    state.error().unwrap_or_default(),
                );
                match &self.error_node {
                    Some(error_node) => current_id = error_node.clone(),
                    None => {
                        log_graph_complete(steps);
                        return Ok(());
                    }
                }
            }
            if run_ctx.is_cancelled() {
                let err = GraphError::Cancelled;
                log_graph_error(&err);
                return Err(err);
            }
            if steps >= self.max_steps {
                let err = GraphError::BudgetExhausted {
                    max_steps: self.max_steps,
                    last_node: current_id,
                };
                log_graph_error(&err);
                return Err(err);
            }
            steps += 1;

            // Route targets are checked before they become current_id.
            let Some(node) = self.nodes.get(&current_id).cloned() else {
                return Err(GraphError::EmptyGraph);
            };

            log_node_start(&current_id, steps);
            log_node_state(&current_id, &*state);
            run_ctx
                .emit(StreamEvent::TaskStart {
                    node_id: current_id.clone(),
                    step: steps,
                })
                .await;

            let result = self.execute_node_with_retry(node, state, run_ctx).await;
            let task_result = match result {
                Ok(update) => {
                    state.merge(update);
                    Ok(())
                }
                Err(e) => {
                    let message = format!("{}: {}", current_id, e);
                    state.set_error(message.clone());
                    Err(message)
                }
            };
            log_state_update(&current_id);
            run_ctx
                .emit(StreamEvent::TaskEnd {
                    node_id: current_id.clone(),
                    result: task_result,
                })
                .await;
            run_ctx
                .emit(StreamEvent::Updates {
                    node_id: current_id.clone(),
                    state: state.clone(),
                })
                .await;

            if on_error_path {
                log_node_complete(&current_id, END);
                log_graph_complete(steps);
                return Ok(());
            }
            if state.error().is_some() {
                continue;
            }

            match self.route(&current_id, state) {
                None => {
                    log_node_complete(&current_id, END);
                    log_graph_complete(steps);
                    return Ok(());
                }
                Some(next) if self.nodes.contains_key(&next) => {
                    log_node_complete(&current_id, &next);
                    current_id = next;
                }
                Some(unknown) => {
                    state.set_error(format!(
                        "{}: router returned unknown step '{}'",
                        current_id, unknown
                    ));
                }
            }
        }
    }

    /// Runs the graph from its entry step and returns the final state.
    ///
    /// On `Err` the partial state is dropped; use [`run`](Self::run) to keep it.
    pub async fn invoke(&self, state: S) -> Result<S, GraphError> {
        self.invoke_with_context(state, &RunContext::new()).await
    }

    pub async fn invoke_with_context(
        &self,
        state: S,
        run_ctx: &RunContext<S>,
    ) -> Result<S, GraphError> {
        let mut state = state;
        self.run(&mut state, run_ctx).await?;
        Ok(state)
    }

    /// Streams execution events from a spawned run.
    ///
    /// The last `Updates` event carries the final state; a `Done` event with
    /// the run's outcome closes the stream.
    pub fn stream(&self, state: S, run_ctx: RunContext<S>) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let run_ctx = run_ctx.with_stream(tx);
        tokio::spawn(async move {
            let mut state = state;
            let outcome = graph.run(&mut state, &run_ctx).await;
            run_ctx.emit(StreamEvent::Done { outcome }).await;
        });
        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use super::*;
    use crate::graph::{FnNode, StateGraph, START};
    use crate::state::test_state::{CounterState, CounterUpdate};

    fn add(id: &'static str, delta: i64) -> Arc<dyn Node<CounterState>> {
        Arc::new(FnNode::new(id, move |s: &CounterState| {
            Ok(CounterUpdate {
                count: Some(*s.count + delta),
                visited: vec![id.to_string()],
                ..Default::default()
            })
        }))
    }

    fn failing(id: &'static str) -> Arc<dyn Node<CounterState>> {
        Arc::new(FnNode::new(id, |_: &CounterState| {
            Err(AgentError::ExecutionFailed("boom".into()))
        }))
    }

    /// Fails with a transient error `failures` times, then succeeds.
    struct FlakyNode {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Node<CounterState> for FlakyNode {
        fn id(&self) -> &str {
            "flaky"
        }
        async fn run(&self, state: &CounterState) -> Result<CounterUpdate, AgentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(AgentError::Reasoner("503".into()));
            }
            Ok(CounterUpdate {
                count: Some(*state.count + 1),
                ..Default::default()
            })
        }
    }

    /// **Scenario**: A router looping back to an earlier step runs until its exit condition.
    #[tokio::test]
    async fn invoke_runs_cycle_until_router_exits() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("inc", add("inc", 1))
            .add_node("check", add("check", 0))
            .add_edge(START, "inc")
            .add_edge("inc", "check")
            .add_conditional_edges(
                "check",
                Arc::new(|s: &CounterState| {
                    if *s.count >= 3 {
                        "done".into()
                    } else {
                        "again".into()
                    }
                }),
                Some(
                    [("done".into(), END.into()), ("again".into(), "inc".into())]
                        .into_iter()
                        .collect(),
                ),
            );
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert_eq!(*state.count, 3);
        assert_eq!(state.visited.len(), 6);
    }

    /// **Scenario**: A router that never exits hits the step ceiling with BudgetExhausted.
    #[tokio::test]
    async fn buggy_router_hits_step_ceiling() {
        let mut graph = StateGraph::<CounterState>::new().with_max_steps(7);
        graph
            .add_node("spin", add("spin", 1))
            .add_edge(START, "spin")
            .add_conditional_edges("spin", Arc::new(|_| "spin".to_string()), None);
        let compiled = graph.compile().unwrap();
        let mut state = CounterState::default();
        let err = compiled.run(&mut state, &RunContext::new()).await.unwrap_err();
        assert_eq!(
            err,
            GraphError::BudgetExhausted {
                max_steps: 7,
                last_node: "spin".into()
            }
        );
        // Partial progress stays in the state.
        assert_eq!(*state.count, 7);
    }

    /// **Scenario**: A step that always fails ends the run after exactly one iteration.
    #[tokio::test]
    async fn failing_step_terminates_in_one_iteration() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("fail", failing("fail"))
            .add_edge(START, "fail")
            .add_conditional_edges("fail", Arc::new(|_| "fail".to_string()), Some(
                [(END.to_string(), END.to_string())].into_iter().collect(),
            ));
        let compiled = graph.compile().unwrap();
        let mut events = compiled.stream(CounterState::default(), RunContext::new());
        let mut starts = 0;
        let mut last_state = None;
        while let Some(ev) = events.next().await {
            match ev {
                StreamEvent::TaskStart { .. } => starts += 1,
                StreamEvent::Updates { state, .. } => last_state = Some(state),
                _ => {}
            }
        }
        assert_eq!(starts, 1);
        let state = last_state.unwrap();
        assert!(state.error().unwrap().contains("boom"));
    }

    /// **Scenario**: A failure jumps to the error node once; the error node's own edge is not followed.
    #[tokio::test]
    async fn failure_routes_to_error_node_then_stops() {
        let mut graph = StateGraph::<CounterState>::new().with_error_node("report");
        graph
            .add_node("a", add("a", 1))
            .add_node("fail", failing("fail"))
            .add_node("never", add("never", 100))
            .add_node("report", add("report", 10))
            .add_edge(START, "a")
            .add_edge("a", "fail")
            .add_edge("fail", "never")
            .add_edge("never", END)
            .add_edge("report", "a");
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert_eq!(state.visited.values(), &["a".to_string(), "report".to_string()]);
        assert_eq!(*state.count, 11);
        assert!(state.error().is_some());
    }

    /// **Scenario**: A failing error node does not loop back to itself.
    #[tokio::test]
    async fn failing_error_node_runs_once() {
        let mut graph = StateGraph::<CounterState>::new().with_error_node("report");
        graph
            .add_node("fail", failing("fail"))
            .add_node("report", failing("report"))
            .add_edge(START, "fail")
            .add_edge("fail", "report")
            .add_edge("report", END);
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert!(state.error().unwrap().starts_with("report:"));
    }

    /// **Scenario**: Unknown router targets become state.error instead of a panic.
    #[tokio::test]
    async fn unknown_router_target_sets_error() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", add("a", 1))
            .add_edge(START, "a")
            .add_conditional_edges("a", Arc::new(|_| "nowhere".to_string()), None);
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert!(state.error().unwrap().contains("nowhere"));
        assert_eq!(*state.count, 1);
    }

    /// **Scenario**: An error already present in the initial state goes straight to the error node.
    #[tokio::test]
    async fn preset_error_skips_to_error_node() {
        let mut graph = StateGraph::<CounterState>::new().with_error_node("report");
        graph
            .add_node("a", add("a", 1))
            .add_node("report", add("report", 10))
            .add_edge(START, "a")
            .add_edge("a", "report")
            .add_edge("report", END);
        let mut initial = CounterState::default();
        initial.set_error("earlier".into());
        let state = graph.compile().unwrap().invoke(initial).await.unwrap();
        assert_eq!(state.visited.values(), &["report".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_run_stops_before_first_step() {
        let mut graph = StateGraph::<CounterState>::new();
        graph.add_node("a", add("a", 1)).add_edge(START, "a").add_edge("a", END);
        let compiled = graph.compile().unwrap();
        let ctx = RunContext::new();
        ctx.cancel.cancel();
        let mut state = CounterState::default();
        assert_eq!(
            compiled.run(&mut state, &ctx).await,
            Err(GraphError::Cancelled)
        );
        assert_eq!(*state.count, 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let mut graph = StateGraph::<CounterState>::new()
            .with_retry_policy(RetryPolicy::fixed(2, Duration::ZERO));
        graph
            .add_node(
                "flaky",
                Arc::new(FlakyNode {
                    failures: 2,
                    calls: AtomicUsize::new(0),
                }),
            )
            .add_edge(START, "flaky")
            .add_edge("flaky", END);
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert!(state.error().is_none());
        assert_eq!(*state.count, 1);
    }

    #[tokio::test]
    async fn retries_exhausted_record_last_error() {
        let mut graph = StateGraph::<CounterState>::new()
            .with_retry_policy(RetryPolicy::fixed(1, Duration::ZERO));
        graph
            .add_node(
                "flaky",
                Arc::new(FlakyNode {
                    failures: 5,
                    calls: AtomicUsize::new(0),
                }),
            )
            .add_edge(START, "flaky")
            .add_edge("flaky", END);
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert!(state.error().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn middleware_wraps_every_step() {
        use crate::graph::LoggingNodeMiddleware;
        let mut graph = StateGraph::<CounterState>::new()
            .with_middleware(Arc::new(LoggingNodeMiddleware::default()));
        graph
            .add_node("a", add("a", 1))
            .add_node("b", add("b", 2))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END);
        let state = graph.compile().unwrap().invoke(CounterState::default()).await.unwrap();
        assert_eq!(*state.count, 3);
    }
}
