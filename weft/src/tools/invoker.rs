//! Tool call site used by the pattern steps.
//!
//! Every call gets the configured timeout and the run's cancellation token.
//! [`ToolInvoker::execute`] never fails: unknown names, tool errors, timeouts and
//! cancellation all come back as an `Error: ...` observation, so a dependent
//! step always has a result to work with.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::prompts::PromptTemplate;
use crate::reasoner::{call_reasoner, Reasoner};

use super::{ToolError, ToolRegistry};

/// Reserved tool name answered by the solver reasoner instead of a registry tool.
pub const REASON_TOOL: &str = "reason";

#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    solver: Option<(Arc<dyn Reasoner>, PromptTemplate)>,
    call_timeout: Option<Duration>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            solver: None,
            call_timeout: None,
        }
    }

    /// Answers `reason` calls (and, in [`execute_or_solve`](Self::execute_or_solve),
    /// unknown tools) with `reasoner`, prompted by `template` with fields
    /// `{tool}` and `{args}`.
    pub fn with_solver(mut self, reasoner: Arc<dyn Reasoner>, template: PromptTemplate) -> Self {
        self.solver = Some((reasoner, template));
        self
    }

    pub fn with_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Calls `name` and reports failures as [`ToolError`].
    pub async fn try_call(
        &self,
        name: &str,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        if name == REASON_TOOL {
            return self.solve(name, &args, cancel).await;
        }
        let tool = self.registry.get(name)?;
        let call = async {
            match self.call_timeout {
                Some(limit) => tokio::time::timeout(limit, tool.call(args))
                    .await
                    .unwrap_or(Err(ToolError::Timeout(limit))),
                None => tool.call(args).await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
            r = call => r,
        }
    }

    /// Calls `name`; any failure becomes a textual observation.
    pub async fn execute(&self, name: &str, args: Value, cancel: &CancellationToken) -> String {
        match self.try_call(name, args, cancel).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool call failed");
                error_observation(name, &e)
            }
        }
    }

    /// Like [`execute`](Self::execute), but a name missing from the registry is
    /// answered by the solver reasoner when one is configured.
    pub async fn execute_or_solve(
        &self,
        name: &str,
        args: Value,
        cancel: &CancellationToken,
    ) -> String {
        if self.solver.is_some() && !self.registry.contains(name) && name != REASON_TOOL {
            tracing::debug!(tool = %name, "no such tool; using solver reasoner");
            return match self.solve(name, &args, cancel).await {
                Ok(text) => text,
                Err(e) => error_observation(name, &e),
            };
        }
        self.execute(name, args, cancel).await
    }

    async fn solve(
        &self,
        name: &str,
        args: &Value,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let Some((reasoner, template)) = &self.solver else {
            return Err(ToolError::NotFound(name.to_string()));
        };
        let args_text = args.to_string();
        let prompt = template.render(&[("tool", name), ("args", &args_text)]);
        call_reasoner(
            reasoner.as_ref(),
            &prompt.system,
            &prompt.user,
            cancel,
            self.call_timeout,
        )
        .await
        .map_err(|e| match e {
            AgentError::Cancelled => ToolError::Cancelled,
            AgentError::Timeout(d) => ToolError::Timeout(d),
            other => ToolError::Execution(other.to_string()),
        })
    }
}

/// Text recorded in place of a result when a call fails.
pub(crate) fn error_observation(name: &str, error: &ToolError) -> String {
    match error {
        ToolError::NotFound(_) => format!("Error: tool '{}' not found", name),
        other => format!("Error: tool '{}' failed: {}", name, other),
    }
}
