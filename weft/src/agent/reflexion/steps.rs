use crate::graph::FnNode;

use super::state::{ReflexionState, ReflexionUpdate};

pub(super) const ATTEMPT: &str = "attempt";
pub(super) const EVALUATE: &str = "evaluate";
pub(super) const REFLECT: &str = "reflect";
pub(super) const FINALIZE: &str = "finalize";

/// Answer is the last attempt, whether or not it passed. On error the report
/// carries the last attempt as the partial result.
pub(super) fn finalize_node() -> FnNode<ReflexionState> {
    FnNode::new(FINALIZE, |s: &ReflexionState| {
        let last = s.last_attempt().unwrap_or("(no attempt)");
        let answer = match s.error.as_deref() {
            Some(error) => format!("Error: {}\n\nLast attempt:\n{}", error, last),
            None => {
                if !s.succeeded() {
                    tracing::info!(trials = *s.trial, "trials exhausted; answering with last attempt");
                }
                last.to_string()
            }
        };
        Ok(ReflexionUpdate {
            answer: Some(Some(answer)),
            ..Default::default()
        })
    })
}

/// Success or `max_trials` used up finishes; otherwise reflect and retry.
pub(super) fn route_after_evaluate(
    max_trials: usize,
) -> impl Fn(&ReflexionState) -> String + Send + Sync + 'static {
    move |s: &ReflexionState| {
        if s.succeeded() || *s.trial >= max_trials {
            FINALIZE.to_string()
        } else {
            REFLECT.to_string()
        }
    }
}
