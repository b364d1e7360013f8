//! Timeout and cancellation around a reasoner call.
//!
//! A reasoner call is the only step operation of unbounded duration, so every
//! pattern step goes through [`call_reasoner`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AgentError;

use super::Reasoner;

/// Calls `reasoner.invoke(system, user)`, racing it against `cancel` and an
/// optional `timeout`.
pub async fn call_reasoner(
    reasoner: &dyn Reasoner,
    system: &str,
    user: &str,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<String, AgentError> {
    if cancel.is_cancelled() {
        return Err(AgentError::Cancelled);
    }
    let call = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, reasoner.invoke(system, user))
                .await
                .unwrap_or(Err(AgentError::Timeout(limit))),
            None => reasoner.invoke(system, user).await,
        }
    };
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        r = call => r,
    };
    if let Err(e) = &result {
        tracing::debug!(error = %e, "reasoner call failed");
    }
    result
}
