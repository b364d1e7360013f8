//! Logging middleware: records step enter/exit and duration around each run.
//!
//! Enabled by the pattern runners when `executor.verbose` is set.

use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::StateRecord;

use super::node_middleware::{InnerRun, NodeMiddleware};

pub struct LoggingNodeMiddleware<S> {
    _phantom: PhantomData<fn() -> S>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: StateRecord,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: InnerRun<S>,
    ) -> Result<S::Update, AgentError> {
        tracing::info!(node_id, "enter node");
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(node_id, elapsed_ms, "exit node"),
            Err(e) => tracing::warn!(node_id, elapsed_ms, error = %e, "exit node with error"),
        }
        result
    }
}
