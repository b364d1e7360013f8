//! Tree search state. The tree lives in one `LastValue`; steps clone it,
//! change it and write it back.

use crate::agent::PatternState;
use crate::channels::{Channel, LastValue, Topic};
use crate::state::StateRecord;

use super::tree::SearchTree;

/// State of one tree search run.
#[derive(Debug, Clone, Default)]
pub struct TreeSearchState {
    pub task: LastValue<String>,
    /// Search tree rooted at the task; replaced whole by `expand` and
    /// `backpropagate`.
    pub tree: LastValue<SearchTree>,
    /// Leaf chosen by the last `select`.
    pub selected: LastValue<Option<usize>>,
    /// Children added by the last `expand`, awaiting evaluation and backpropagation.
    pub pending: LastValue<Vec<usize>>,
    /// Completed select..check_budget cycles.
    pub iteration: LastValue<usize>,
    /// `iteration` reached `max_iterations`.
    pub budget_exhausted: LastValue<bool>,
    /// `select` reached a terminal leaf.
    pub solved: LastValue<bool>,
    pub answer: LastValue<Option<String>>,
    /// One line per step that changed the tree.
    pub history: Topic<String>,
    pub error: LastValue<Option<String>>,
}

/// Partial write returned by a tree search step. `None` / empty leaves a
/// field as is.
#[derive(Debug, Default)]
pub struct TreeSearchUpdate {
    /// Whole replacement tree.
    pub tree: Option<SearchTree>,
    pub selected: Option<Option<usize>>,
    /// `Some(vec![])` clears the pending children after backpropagation.
    pub pending: Option<Vec<usize>>,
    pub iteration: Option<usize>,
    pub budget_exhausted: Option<bool>,
    pub solved: Option<bool>,
    pub answer: Option<Option<String>>,
    /// Appended to [`TreeSearchState::history`].
    pub history: Vec<String>,
    pub error: Option<Option<String>>,
}

impl TreeSearchState {
    pub fn new(task: impl Into<String>) -> Self {
        let task = task.into();
        Self {
            tree: LastValue::new(SearchTree::new(task.clone())),
            task: LastValue::new(task),
            ..Self::default()
        }
    }
}

impl StateRecord for TreeSearchState {
    type Update = TreeSearchUpdate;

    fn merge(&mut self, update: TreeSearchUpdate) {
        self.tree.apply(update.tree);
        self.selected.apply(update.selected);
        self.pending.apply(update.pending);
        self.iteration.apply(update.iteration);
        self.budget_exhausted.apply(update.budget_exhausted);
        self.solved.apply(update.solved);
        self.answer.apply(update.answer);
        self.history.apply(update.history);
        self.error.apply(update.error);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: String) {
        self.error.apply(Some(Some(message)));
    }
}

impl PatternState for TreeSearchState {
    fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// The best path found so far.
    fn partial_summary(&self) -> String {
        self.tree.describe_path(&self.tree.best_path())
    }
}
