//! Mock reasoner for tests and demos.
//!
//! Answers from a script (one response per call, in order), then from a fixed
//! fallback or a responder closure. Records every `(system, user)` pair so tests
//! can count calls per role.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgentError;

use super::Reasoner;

type Responder = Box<dyn Fn(&str, &str) -> Result<String, AgentError> + Send + Sync>;

/// Scripted reasoner.
///
/// ```rust
/// use weft::reasoner::MockReasoner;
///
/// let mock = MockReasoner::scripted(["SCORE: 0.3", "SCORE: 0.7"]).with_fallback("SCORE: 0.5");
/// assert_eq!(mock.call_count(), 0);
/// ```
pub struct MockReasoner {
    script: Mutex<VecDeque<Result<String, AgentError>>>,
    fallback: Option<String>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockReasoner {
    fn empty() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            responder: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::empty().with_fallback(text)
    }

    /// Answers each script entry once, in order; errors once the script runs out
    /// unless a fallback is set.
    pub fn scripted<I, T>(responses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mock = Self::empty();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(responses.into_iter().map(|r| Ok(r.into())));
        }
        mock
    }

    /// Always fails with `AgentError::Reasoner(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::empty().with_responder(move |_, _| Err(AgentError::Reasoner(message.clone())))
    }

    /// Answers by calling `f(system, user)` once the script is exhausted.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        Self::empty().with_responder(f)
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    /// Appends a failing entry to the script.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(AgentError::Reasoner(message.into())));
        }
        self
    }

    /// Sleeps before answering (for timeout and cancellation tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// All `(system, user)` prompt pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_response(&self, system: &str, user: &str) -> Result<String, AgentError> {
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(response) = scripted {
            return response;
        }
        if let Some(responder) = &self.responder {
            return responder(system, user);
        }
        self.fallback
            .clone()
            .ok_or_else(|| AgentError::Reasoner("mock script exhausted".into()))
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn invoke(&self, system: &str, user: &str) -> Result<String, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), user.to_string()));
        }
        let response = self.next_response(system, user);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}
