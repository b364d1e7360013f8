//! Placeholder planner state: the template, its solver requests and the
//! values solved so far.

use crate::agent::PatternState;
use crate::channels::{Channel, LastValue, Topic, WriteOnceMap};
use crate::parse::{PlaceholderPlan, SolverRequest};
use crate::state::StateRecord;

use super::template::PlanTemplate;

/// State of one placeholder-planner run.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderState {
    pub task: LastValue<String>,
    /// Answer template; never modified once planned.
    pub template: LastValue<PlanTemplate>,
    /// One solver request per placeholder, in declaration order.
    pub requests: LastValue<Vec<SolverRequest>>,
    /// Placeholder name → value. Written once per name.
    pub solved: WriteOnceMap<String>,
    /// Template with every solved placeholder substituted.
    pub filled: LastValue<Option<String>>,
    pub answer: LastValue<Option<String>>,
    /// Placeholder names in the order they were solved.
    pub resolution_order: Topic<String>,
    pub error: LastValue<Option<String>>,
}

/// Partial write returned by a placeholder step. `None` / empty leaves a
/// field as is.
#[derive(Debug, Default)]
pub struct PlaceholderUpdate {
    pub template: Option<PlanTemplate>,
    pub requests: Option<Vec<SolverRequest>>,
    /// `(placeholder, value)` pairs; a name already solved keeps its value.
    pub solved: Vec<(String, String)>,
    pub filled: Option<Option<String>>,
    pub answer: Option<Option<String>>,
    /// Appended to [`PlaceholderState::resolution_order`].
    pub resolution_order: Vec<String>,
    pub error: Option<Option<String>>,
}

impl PlaceholderState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: LastValue::new(task.into()),
            ..Self::default()
        }
    }

    /// Starts from an existing plan instead of asking the planner.
    pub fn with_plan(task: impl Into<String>, plan: PlaceholderPlan) -> Self {
        Self {
            template: LastValue::new(PlanTemplate::new(plan.template)),
            requests: LastValue::new(plan.requests),
            ..Self::new(task)
        }
    }

    /// `name = value` lines in request order, then any template placeholder
    /// that no request declared.
    pub fn format_solved(&self) -> String {
        let mut names: Vec<String> = self.requests.iter().map(|r| r.placeholder.clone()).collect();
        for p in self.template.placeholders() {
            if !names.contains(&p) {
                names.push(p);
            }
        }
        names
            .iter()
            .map(|name| match self.solved.get(name) {
                Some(v) => format!("{} = {}", name, v),
                None => format!("{} = (unresolved)", name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The filled template, or the template filled with what is solved so far.
    pub fn current_fill(&self) -> String {
        match self.filled.as_deref() {
            Some(text) => text.to_string(),
            None => self.template.fill(&self.solved),
        }
    }
}

impl StateRecord for PlaceholderState {
    type Update = PlaceholderUpdate;

    fn merge(&mut self, update: PlaceholderUpdate) {
        self.template.apply(update.template);
        self.requests.apply(update.requests);
        self.solved.apply(update.solved);
        self.filled.apply(update.filled);
        self.answer.apply(update.answer);
        self.resolution_order.apply(update.resolution_order);
        self.error.apply(update.error);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: String) {
        self.error.apply(Some(Some(message)));
    }
}

impl PatternState for PlaceholderState {
    fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    fn partial_summary(&self) -> String {
        format!("{}\n\n{}", self.current_fill(), self.format_solved())
    }
}
