use crate::agent::PatternState;
use crate::channels::{Channel, LastValue, Topic};
use crate::parse::Verdict;
use crate::state::StateRecord;

/// State of one trial loop.
#[derive(Debug, Clone, Default)]
pub struct ReflexionState {
    pub task: LastValue<String>,
    /// Trials started so far, counting from 1.
    pub trial: LastValue<usize>,
    pub attempts: Topic<String>,
    pub evaluations: Topic<String>,
    /// Lessons written after each failed trial, carried into later attempts.
    pub reflections: Topic<String>,
    pub verdict: LastValue<Option<Verdict>>,
    pub answer: LastValue<Option<String>>,
    pub error: LastValue<Option<String>>,
}

#[derive(Debug, Default)]
pub struct ReflexionUpdate {
    pub trial: Option<usize>,
    pub attempts: Vec<String>,
    pub evaluations: Vec<String>,
    pub reflections: Vec<String>,
    pub verdict: Option<Option<Verdict>>,
    pub answer: Option<Option<String>>,
    pub error: Option<Option<String>>,
}

impl ReflexionState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: LastValue::new(task.into()),
            ..Self::default()
        }
    }

    pub fn last_attempt(&self) -> Option<&str> {
        self.attempts.last().map(String::as_str)
    }

    /// Numbered lessons, or `(none)` before the first reflection.
    pub fn format_reflections(&self) -> String {
        if self.reflections.is_empty() {
            return "(none)".to_string();
        }
        self.reflections
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn succeeded(&self) -> bool {
        *self.verdict == Some(Verdict::Success)
    }
}

impl StateRecord for ReflexionState {
    type Update = ReflexionUpdate;

    fn merge(&mut self, update: ReflexionUpdate) {
        self.trial.apply(update.trial);
        self.attempts.apply(update.attempts);
        self.evaluations.apply(update.evaluations);
        self.reflections.apply(update.reflections);
        self.verdict.apply(update.verdict);
        self.answer.apply(update.answer);
        self.error.apply(update.error);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: String) {
        self.error.apply(Some(Some(message)));
    }
}

impl PatternState for ReflexionState {
    fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    fn partial_summary(&self) -> String {
        self.last_attempt().unwrap_or("(no attempt)").to_string()
    }
}
