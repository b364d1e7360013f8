//! State graph builder: named steps, static edges, conditional edges.
//!
//! Add steps with `add_node`, wire them with `add_edge(from, to)` using `START`
//! and `END`, and route on state with `add_conditional_edges`. Routers may point
//! back to earlier steps; cycles are bounded by the executor step ceiling
//! (`with_max_steps`), not by compile-time checks.
//!
//! # Error routing
//!
//! `with_error_node(id)` names the terminal formatting step. When a step fails
//! (or `state.error` becomes set) the executor jumps there once and stops after
//! it runs. Without an error node the run stops right after the failing step.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::state::StateRecord;

use super::compile_error::CompilationError;
use super::compiled::CompiledStateGraph;
use super::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use super::node::Node;
use super::node_middleware::NodeMiddleware;
use super::retry::RetryPolicy;

/// Sentinel for graph entry: `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: `add_edge(last_node_id, END)` or a router returning it.
pub const END: &str = "__end__";

/// Default executor step ceiling.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// State graph: steps plus static and conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S: StateRecord> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    retry_policy: RetryPolicy,
    error_node: Option<String>,
    max_steps: usize,
}

impl<S: StateRecord> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateRecord> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
            retry_policy: RetryPolicy::None,
            error_node: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Wraps every step run with `middleware`.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Retries transient step failures before they are recorded in `state.error`.
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use weft::graph::{RetryPolicy, StateGraph};
    /// # use weft::state::StateRecord;
    /// # fn build<S: StateRecord>() -> StateGraph<S> {
    /// StateGraph::<S>::new().with_retry_policy(RetryPolicy::fixed(2, Duration::from_millis(50)))
    /// # }
    /// ```
    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self {
            retry_policy,
            ..self
        }
    }

    /// Names the error-terminal step (e.g. `"finalize"`).
    pub fn with_error_node(self, id: impl Into<String>) -> Self {
        Self {
            error_node: Some(id.into()),
            ..self
        }
    }

    /// Sets the executor step ceiling. Must be at least 1.
    pub fn with_max_steps(self, max_steps: usize) -> Self {
        Self { max_steps, ..self }
    }

    /// Adds a step; replaces any step with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a static edge. Use `START` for the entry and `END` for exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: after it runs, `path(state)` returns a
    /// label, mapped through `path_map` when given (unmapped labels are used as
    /// step ids directly).
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "check_budget",
    ///     Arc::new(|s: &TreeSearchState| if *s.budget_exhausted { "done".into() } else { "continue".into() }),
    ///     Some([("done".into(), "finalize".into()), ("continue".into(), "select".into())].into_iter().collect()),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Validates the graph and builds the executable form.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        if self.max_steps == 0 {
            return Err(CompilationError::ZeroStepBudget);
        }
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(path_map) = &router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }
        if let Some(error_node) = &self.error_node {
            if !self.nodes.contains_key(error_node) {
                return Err(CompilationError::ErrorNodeNotFound(error_node.clone()));
            }
        }

        let mut start_targets = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone());
        let first = match (start_targets.next(), start_targets.next()) {
            (Some(first), None) => first,
            _ => return Err(CompilationError::MissingStart),
        };

        let mut next_map: HashMap<String, NextEntry<S>> = HashMap::new();
        let mut edge_froms = HashSet::new();
        for (from, to) in self.edges.iter().filter(|(f, _)| f != START) {
            if !edge_froms.insert(from.clone()) {
                return Err(CompilationError::DuplicateEdge(from.clone()));
            }
            next_map.insert(from.clone(), NextEntry::Unconditional(to.clone()));
        }
        for (source, router) in &self.conditional_edges {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
            next_map.insert(source.clone(), NextEntry::Conditional(router.clone()));
        }

        // Sorted so the reported id does not depend on HashMap order.
        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        if let Some(id) = ids.into_iter().find(|id| !next_map.contains_key(*id)) {
            return Err(CompilationError::NoOutgoingEdge(id.clone()));
        }

        let reaches_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !reaches_end {
            return Err(CompilationError::MissingEnd);
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
            middleware: self.middleware,
            retry_policy: self.retry_policy,
            error_node: self.error_node,
            max_steps: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FnNode;
    use crate::state::test_state::{CounterState, CounterUpdate};

    fn noop(id: &'static str) -> Arc<dyn Node<CounterState>> {
        Arc::new(FnNode::new(id, |_: &CounterState| Ok(CounterUpdate::default())))
    }

    /// **Scenario**: A cycle through a conditional router compiles.
    #[test]
    fn compile_accepts_cycle() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", noop("a"))
            .add_node("b", noop("b"))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_conditional_edges(
                "b",
                Arc::new(|s: &CounterState| if *s.count > 3 { END.into() } else { "a".into() }),
                None,
            );
        assert!(graph.compile().is_ok());
    }

    /// **Scenario**: Compile fails when a node has both an outgoing edge and conditional edges.
    #[test]
    fn compile_fails_when_node_has_both_edge_and_conditional() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", noop("a"))
            .add_node("b", noop("b"))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END)
            .add_conditional_edges("a", Arc::new(|_| "b".to_string()), None);
        match graph.compile() {
            Err(CompilationError::NodeHasBothEdgeAndConditional(id)) => assert_eq!(id, "a"),
            Err(e) => panic!("unexpected error: {:?}", e),
            Ok(_) => panic!("expected compile error"),
        }
    }

    #[test]
    fn compile_fails_on_invalid_path_map_target() {
        let mut graph = StateGraph::<CounterState>::new();
        graph.add_node("a", noop("a")).add_edge(START, "a").add_conditional_edges(
            "a",
            Arc::new(|_| "x".to_string()),
            Some([("x".to_string(), "missing".to_string())].into_iter().collect()),
        );
        assert!(matches!(
            graph.compile(),
            Err(CompilationError::InvalidConditionalPathMap(t)) if t == "missing"
        ));
    }

    #[test]
    fn compile_fails_on_unknown_error_node() {
        let mut graph = StateGraph::<CounterState>::new().with_error_node("finalize");
        graph.add_node("a", noop("a")).add_edge(START, "a").add_edge("a", END);
        assert!(matches!(
            graph.compile(),
            Err(CompilationError::ErrorNodeNotFound(id)) if id == "finalize"
        ));
    }

    #[test]
    fn compile_fails_on_dead_end_node() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", noop("a"))
            .add_node("orphan", noop("orphan"))
            .add_edge(START, "a")
            .add_edge("a", END);
        assert!(matches!(
            graph.compile(),
            Err(CompilationError::NoOutgoingEdge(id)) if id == "orphan"
        ));
    }

    #[test]
    fn compile_fails_without_start_or_with_two_starts() {
        let mut graph = StateGraph::<CounterState>::new();
        graph.add_node("a", noop("a")).add_edge("a", END);
        assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));

        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", noop("a"))
            .add_node("b", noop("b"))
            .add_edge(START, "a")
            .add_edge(START, "b")
            .add_edge("a", END)
            .add_edge("b", END);
        assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
    }

    #[test]
    fn compile_fails_when_end_unreachable() {
        let mut graph = StateGraph::<CounterState>::new();
        graph
            .add_node("a", noop("a"))
            .add_node("b", noop("b"))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "a");
        assert!(matches!(graph.compile(), Err(CompilationError::MissingEnd)));
    }

    #[test]
    fn compile_rejects_zero_step_budget() {
        let mut graph = StateGraph::<CounterState>::new().with_max_steps(0);
        graph.add_node("a", noop("a")).add_edge(START, "a").add_edge("a", END);
        assert!(matches!(graph.compile(), Err(CompilationError::ZeroStepBudget)));
    }
}
