//! Reasoning patterns, each a cyclic state graph.
//!
//! | pattern | steps |
//! |---|---|
//! | [`tree_search`] | select → expand → evaluate → backpropagate → check_budget → {select \| finalize} |
//! | [`dag`] | plan → dispatch → check_completion → {dispatch \| synthesize} |
//! | [`placeholder`] | plan → dispatch → collect → integrate |
//! | [`reflexion`] | attempt → evaluate → {finalize \| reflect → attempt} |
//!
//! Every pattern routes step failures to its last step, which writes an
//! error report with the partial results instead of failing.
//!
//! [`build_pattern`] picks a pattern by [`PatternKind`] and returns it as a
//! [`Pattern`] trait object.

pub mod dag;
pub mod placeholder;
pub(crate) mod prompted;
pub mod reflexion;
pub mod tree_search;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::WeftConfig;
use crate::prompts::{default_from_embedded, PromptSet};
use crate::reasoner::Reasoners;
use crate::runner_common::RunError;
use crate::state::StateRecord;
use crate::tools::ToolRegistry;

/// State record of a pattern: exposes the answer and a summary of partial
/// results for error reports.
pub trait PatternState: StateRecord {
    fn answer(&self) -> Option<&str>;

    /// What the run produced so far, as text.
    fn partial_summary(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    TreeSearch,
    Dag,
    Placeholder,
    Reflexion,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        PatternKind::TreeSearch,
        PatternKind::Dag,
        PatternKind::Placeholder,
        PatternKind::Reflexion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::TreeSearch => "tree_search",
            PatternKind::Dag => "dag",
            PatternKind::Placeholder => "placeholder",
            PatternKind::Reflexion => "reflexion",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tree_search" | "tree" => Ok(PatternKind::TreeSearch),
            "dag" => Ok(PatternKind::Dag),
            "placeholder" => Ok(PatternKind::Placeholder),
            "reflexion" => Ok(PatternKind::Reflexion),
            other => Err(format!("unknown pattern: {}", other)),
        }
    }
}

/// Everything a pattern runner is built from.
#[derive(Clone)]
pub struct PatternDeps {
    pub reasoners: Reasoners,
    pub tools: Arc<ToolRegistry>,
    pub prompts: PromptSet,
    pub config: WeftConfig,
}

impl PatternDeps {
    /// No tools, embedded prompts, default config.
    pub fn new(reasoners: Reasoners) -> Self {
        Self {
            reasoners,
            tools: Arc::new(ToolRegistry::new()),
            prompts: default_from_embedded(),
            config: WeftConfig::default(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_config(mut self, config: WeftConfig) -> Self {
        self.config = config;
        self
    }
}

/// A runnable pattern: task in, answer out.
#[async_trait]
pub trait Pattern: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Runs until an answer, an error report or cancellation of `cancel`.
    async fn run_with_cancel(&self, task: &str, cancel: CancellationToken)
        -> Result<String, RunError>;

    async fn run(&self, task: &str) -> Result<String, RunError> {
        self.run_with_cancel(task, CancellationToken::new()).await
    }
}

/// Builds the runner for `kind`.
///
/// ```
/// use std::sync::Arc;
/// use weft::agent::{build_pattern, PatternDeps, PatternKind};
/// use weft::reasoner::{MockReasoner, Reasoners};
///
/// let deps = PatternDeps::new(Reasoners::new(Arc::new(MockReasoner::always("ok"))));
/// let pattern = build_pattern("dag".parse().unwrap(), &deps).unwrap();
/// assert_eq!(pattern.kind(), PatternKind::Dag);
/// ```
pub fn build_pattern(kind: PatternKind, deps: &PatternDeps) -> Result<Box<dyn Pattern>, RunError> {
    tracing::debug!(pattern = %kind, "building pattern");
    Ok(match kind {
        PatternKind::TreeSearch => Box::new(tree_search::TreeSearchRunner::new(deps)?),
        PatternKind::Dag => Box::new(dag::DagRunner::new(deps)?),
        PatternKind::Placeholder => Box::new(placeholder::PlaceholderRunner::new(deps)?),
        PatternKind::Reflexion => Box::new(reflexion::ReflexionRunner::new(deps)?),
    })
}
