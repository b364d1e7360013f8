//! DAG dispatch state: the plan, results keyed by node id, and tick progress.
//!
//! `plan` writes `nodes`; `dispatch` writes `results`, `executed` and `tick`;
//! `check_completion` writes `done`; `synthesize` writes `answer`.

use crate::agent::PatternState;
use crate::channels::{Channel, LastValue, Topic, WriteOnceMap};
use crate::parse::TaskNode;
use crate::state::StateRecord;

/// State of one DAG dispatch run.
#[derive(Debug, Clone, Default)]
pub struct DagState {
    /// The user's task; the planner and synthesizer both see it.
    pub task: LastValue<String>,
    /// Plan in declaration order; fixed after `plan`.
    pub nodes: LastValue<Vec<TaskNode>>,
    /// Node id → tool output (or `Error: ...` observation). Written once per id.
    pub results: WriteOnceMap<String>,
    /// Dispatch ticks run so far.
    pub tick: LastValue<usize>,
    /// Every planned node has a result.
    pub done: LastValue<bool>,
    /// Synthesized answer, or the error report when the run failed.
    pub answer: LastValue<Option<String>>,
    /// Node ids in the order their results were recorded.
    pub executed: Topic<String>,
    /// First step failure or stuck-graph message.
    pub error: LastValue<Option<String>>,
}

/// Partial write returned by a DAG step. `None` / empty leaves a field as is.
#[derive(Debug, Default)]
pub struct DagUpdate {
    /// Replaces the plan; only `plan` writes it.
    pub nodes: Option<Vec<TaskNode>>,
    /// `(node id, result)` pairs; an id already present keeps its first result.
    pub results: Vec<(String, String)>,
    pub tick: Option<usize>,
    pub done: Option<bool>,
    pub answer: Option<Option<String>>,
    /// Appended to [`DagState::executed`].
    pub executed: Vec<String>,
    pub error: Option<Option<String>>,
}

impl DagState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: LastValue::new(task.into()),
            ..Self::default()
        }
    }

    /// Starts from an existing plan instead of asking the planner.
    pub fn with_plan(task: impl Into<String>, nodes: Vec<TaskNode>) -> Self {
        Self {
            nodes: LastValue::new(nodes),
            ..Self::new(task)
        }
    }

    pub fn result(&self, id: &str) -> Option<&str> {
        self.results.get(id).map(String::as_str)
    }

    /// `id / tool / result` lines in plan order; unresolved nodes are marked.
    pub fn format_results(&self) -> String {
        self.nodes
            .iter()
            .map(|n| match self.result(&n.id) {
                Some(r) => format!("{} / {} / {}", n.id, n.tool, r),
                None => format!("{} / {} / (not run)", n.id, n.tool),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StateRecord for DagState {
    type Update = DagUpdate;

    fn merge(&mut self, update: DagUpdate) {
        self.nodes.apply(update.nodes);
        self.results.apply(update.results);
        self.tick.apply(update.tick);
        self.done.apply(update.done);
        self.answer.apply(update.answer);
        self.executed.apply(update.executed);
        self.error.apply(update.error);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: String) {
        self.error.apply(Some(Some(message)));
    }
}

impl PatternState for DagState {
    fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    fn partial_summary(&self) -> String {
        self.format_results()
    }
}
