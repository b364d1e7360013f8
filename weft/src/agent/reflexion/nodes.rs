//! Attempt, evaluate and reflect steps. Each asks one prompted reasoner.

use async_trait::async_trait;

use crate::agent::prompted::PromptedReasoner;
use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::parse::{verdict_or_failure, Verdict};
use crate::stream::PatternEvent;

use super::state::{ReflexionState, ReflexionUpdate};
use super::steps::{ATTEMPT, EVALUATE, REFLECT};

pub(super) struct AttemptNode {
    actor: PromptedReasoner,
}

impl AttemptNode {
    pub(super) fn new(actor: PromptedReasoner) -> Self {
        Self { actor }
    }
}

#[async_trait]
impl Node<ReflexionState> for AttemptNode {
    fn id(&self) -> &str {
        ATTEMPT
    }

    async fn run(&self, state: &ReflexionState) -> Result<ReflexionUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &ReflexionState,
        ctx: &RunContext<ReflexionState>,
    ) -> Result<ReflexionUpdate, AgentError> {
        let trial = *state.trial + 1;
        let reflections = state.format_reflections();
        let attempt = self
            .actor
            .ask(
                &[("task", state.task.as_str()), ("reflections", &reflections)],
                &ctx.cancel,
            )
            .await?;
        tracing::debug!(trial, "attempt written");
        Ok(ReflexionUpdate {
            trial: Some(trial),
            attempts: vec![attempt.trim().to_string()],
            ..Default::default()
        })
    }
}

pub(super) struct EvaluateNode {
    judge: PromptedReasoner,
}

impl EvaluateNode {
    pub(super) fn new(judge: PromptedReasoner) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Node<ReflexionState> for EvaluateNode {
    fn id(&self) -> &str {
        EVALUATE
    }

    async fn run(&self, state: &ReflexionState) -> Result<ReflexionUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    /// A reply without a recognizable verdict counts as failure.
    async fn run_with_context(
        &self,
        state: &ReflexionState,
        ctx: &RunContext<ReflexionState>,
    ) -> Result<ReflexionUpdate, AgentError> {
        let attempt = state.last_attempt().unwrap_or_default();
        let evaluation = self
            .judge
            .ask(&[("task", state.task.as_str()), ("attempt", attempt)], &ctx.cancel)
            .await?;
        let verdict = verdict_or_failure(&evaluation);
        tracing::debug!(trial = *state.trial, ?verdict, "attempt evaluated");
        ctx.emit_custom(PatternEvent::TrialVerdict {
            trial: *state.trial,
            success: verdict == Verdict::Success,
        })
        .await;
        Ok(ReflexionUpdate {
            evaluations: vec![evaluation.trim().to_string()],
            verdict: Some(Some(verdict)),
            ..Default::default()
        })
    }
}

pub(super) struct ReflectNode {
    critic: PromptedReasoner,
}

impl ReflectNode {
    pub(super) fn new(critic: PromptedReasoner) -> Self {
        Self { critic }
    }
}

#[async_trait]
impl Node<ReflexionState> for ReflectNode {
    fn id(&self) -> &str {
        REFLECT
    }

    async fn run(&self, state: &ReflexionState) -> Result<ReflexionUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new()).await
    }

    async fn run_with_context(
        &self,
        state: &ReflexionState,
        ctx: &RunContext<ReflexionState>,
    ) -> Result<ReflexionUpdate, AgentError> {
        let attempt = state.last_attempt().unwrap_or_default();
        let evaluation = state.evaluations.last().map(String::as_str).unwrap_or_default();
        let lesson = self
            .critic
            .ask(
                &[
                    ("task", state.task.as_str()),
                    ("attempt", attempt),
                    ("evaluation", evaluation),
                ],
                &ctx.cancel,
            )
            .await?;
        Ok(ReflexionUpdate {
            reflections: vec![lesson.trim().to_string()],
            verdict: Some(None),
            ..Default::default()
        })
    }
}
