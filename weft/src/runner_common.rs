//! Shared run plumbing for the pattern runners.
//!
//! - [`configure_graph`]: apply the executor config (step ceiling, retry, verbose logging),
//!   raising the ceiling to what the pattern's own budget needs.
//! - [`invoke_pattern`]: run a compiled graph, keeping partial results on failure.
//! - [`run_stream_with_callback`]: same, forwarding every event to a callback.
//! - [`into_answer`]: final state → answer, or [`RunError::Failed`] when the run
//!   ended on the error path.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::agent::PatternState;
use crate::config::ExecutorConfig;
use crate::graph::{
    CompilationError, CompiledStateGraph, GraphError, LoggingNodeMiddleware, RunContext,
    StateGraph,
};
use crate::prompts::LoadError;
use crate::state::StateRecord;
use crate::stream::StreamEvent;

/// Failure of a pattern run. Runtime variants carry what was produced before
/// the failure.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("prompt error: {0}")]
    Prompt(#[from] LoadError),
    /// A step failed and the error step reported it.
    #[error("run failed: {message}")]
    Failed { message: String, partial: String },
    /// The executor stopped the run (step ceiling, cancellation).
    #[error("graph error: {source}")]
    Graph {
        #[source]
        source: GraphError,
        partial: String,
    },
}

impl RunError {
    pub fn partial(&self) -> Option<&str> {
        match self {
            RunError::Failed { partial, .. } | RunError::Graph { partial, .. } => Some(partial),
            RunError::Compilation(_) | RunError::Prompt(_) => None,
        }
    }
}

/// Applies step ceiling, retry policy and (when verbose) logging middleware.
///
/// `budget_steps` is the most steps a run can take while its pattern budget
/// still ends it normally; the ceiling is never set below it.
pub fn configure_graph<S: StateRecord>(
    graph: StateGraph<S>,
    executor: &ExecutorConfig,
    budget_steps: usize,
) -> StateGraph<S> {
    let max_steps = executor.max_steps.max(budget_steps);
    if max_steps > executor.max_steps {
        tracing::debug!(
            configured = executor.max_steps,
            max_steps,
            "step ceiling raised to fit the pattern budget"
        );
    }
    let graph = graph
        .with_max_steps(max_steps)
        .with_retry_policy(executor.retry_policy());
    if executor.verbose {
        graph.with_middleware(Arc::new(LoggingNodeMiddleware::<S>::default()))
    } else {
        graph
    }
}

fn graph_failure<S: PatternState>(source: GraphError, state: &S) -> RunError {
    RunError::Graph {
        source,
        partial: state.partial_summary(),
    }
}

/// Runs `compiled` from `state`; on an executor error the partial results
/// travel in [`RunError::Graph`].
pub async fn invoke_pattern<S: PatternState>(
    compiled: &CompiledStateGraph<S>,
    state: S,
    run_ctx: &RunContext<S>,
) -> Result<S, RunError> {
    let mut state = state;
    match compiled.run(&mut state, run_ctx).await {
        Ok(()) => Ok(state),
        Err(source) => Err(graph_failure(source, &state)),
    }
}

/// Like [`invoke_pattern`], passing every [`StreamEvent`] to `on_event` as it
/// happens.
pub async fn run_stream_with_callback<S, F>(
    compiled: &CompiledStateGraph<S>,
    state: S,
    run_ctx: &RunContext<S>,
    mut on_event: F,
) -> Result<S, RunError>
where
    S: PatternState,
    F: FnMut(StreamEvent<S>),
{
    let (tx, mut rx) = mpsc::channel(128);
    let streaming_ctx = run_ctx.clone().with_stream(tx);
    let run = async move {
        let mut state = state;
        let result = compiled.run(&mut state, &streaming_ctx).await;
        // Dropping the context closes the channel so the consumer ends.
        drop(streaming_ctx);
        (state, result)
    };
    let consume = async {
        while let Some(event) = rx.recv().await {
            on_event(event);
        }
    };
    let ((state, result), ()) = tokio::join!(run, consume);
    match result {
        Ok(()) => Ok(state),
        Err(source) => Err(graph_failure(source, &state)),
    }
}

/// The answer of a finished run, or [`RunError::Failed`] when `state.error` is
/// set; its `partial` is the error step's report.
pub fn into_answer<S: PatternState>(state: S) -> Result<String, RunError> {
    if let Some(message) = state.error() {
        let partial = state
            .answer()
            .map(str::to_string)
            .unwrap_or_else(|| state.partial_summary());
        return Err(RunError::Failed {
            message: message.to_string(),
            partial,
        });
    }
    Ok(state.answer().unwrap_or_default().to_string())
}
