//! # Weft
//!
//! LLM reasoning patterns on one cyclic state graph. A pattern is a
//! [`StateGraph`] over a typed state record; steps return partial updates,
//! the executor merges them field by field and follows static or conditional
//! edges, looping until `END`, a step ceiling, or cancellation.
//!
//! ## Patterns
//!
//! - [`TreeSearchRunner`]: UCB tree search. Select a leaf, expand it into
//!   candidate next steps, score them, back the scores up to the root, repeat.
//! - [`DagRunner`]: plan tool calls with dependencies, dispatch every ready
//!   call concurrently, substitute `#id` results into dependents.
//! - [`PlaceholderRunner`]: write the answer first with `{placeholders}`, then
//!   solve each placeholder and fill the template.
//! - [`ReflexionRunner`]: attempt, judge, reflect, retry with the lessons.
//!
//! [`build_pattern`] picks one by [`PatternKind`]; all implement [`Pattern`].
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`RunContext`], retry and middleware.
//! - [`channels`]: per-field merge policies ([`LastValue`], [`Topic`], [`WriteOnceMap`]).
//! - [`state`]: the [`StateRecord`] contract.
//! - [`reasoner`]: the [`Reasoner`] trait, role routing ([`Reasoners`]), timeout and cancellation guard, [`MockReasoner`].
//! - [`tools`]: [`Tool`], [`ToolRegistry`], [`ToolInvoker`].
//! - [`parse`]: tolerant parsers for reasoner replies, each with a fallback.
//! - [`prompts`]: YAML prompt templates, embedded with optional directory overrides.
//! - [`config`]: [`WeftConfig`] from TOML, `.env` and `WEFT_*` variables.
//! - [`stream`]: [`StreamEvent`] and [`PatternEvent`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weft::{build_pattern, MockReasoner, PatternDeps, PatternKind, Reasoners};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let reasoners = Reasoners::new(Arc::new(MockReasoner::always("SUCCESS: 4")));
//! let pattern = build_pattern(PatternKind::Reflexion, &PatternDeps::new(reasoners)).unwrap();
//! match pattern.run("What is 2 + 2?").await {
//!     Ok(answer) => println!("{}", answer),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! # }
//! ```

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod graph;
pub mod parse;
pub mod prompts;
pub mod reasoner;
pub mod runner_common;
pub mod state;
pub mod stream;
pub mod tools;

pub use agent::dag::{DagRunner, DagState};
pub use agent::placeholder::{PlaceholderRunner, PlaceholderState};
pub use agent::reflexion::{ReflexionRunner, ReflexionState};
pub use agent::tree_search::{TreeSearchRunner, TreeSearchState};
pub use agent::{build_pattern, Pattern, PatternDeps, PatternKind, PatternState};
pub use channels::{Channel, LastValue, Topic, WriteOnceMap};
pub use config::{ConfigError, WeftConfig};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, FnNode, GraphError, Node, NodeMiddleware, RetryPolicy,
    RunContext, StateGraph, END, START,
};
pub use prompts::{LoadError, PromptSet, PromptTemplate};
pub use reasoner::{MockReasoner, Reasoner, ReasonerRole, Reasoners};
pub use runner_common::RunError;
pub use state::StateRecord;
pub use stream::{PatternEvent, StreamEvent};
pub use tools::{FnTool, Tool, ToolError, ToolInvoker, ToolRegistry, ToolSpec};
