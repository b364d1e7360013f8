//! FnNode: a node backed by a synchronous closure.
//!
//! For steps that are pure state transformations (budget checks, completion
//! checks, collecting results). Steps that call a reasoner or tool implement
//! [`Node`] directly.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::StateRecord;

use super::Node;

type StepFn<S> =
    Box<dyn Fn(&S) -> Result<<S as StateRecord>::Update, AgentError> + Send + Sync + 'static>;

/// Node whose `run` calls `f(&state)`.
///
/// ```rust,ignore
/// graph.add_node("check_budget", Arc::new(FnNode::new("check_budget", |s: &MyState| {
///     Ok(MyUpdate { iteration: Some(*s.iteration + 1), ..Default::default() })
/// })));
/// ```
pub struct FnNode<S: StateRecord> {
    name: String,
    f: StepFn<S>,
}

impl<S: StateRecord> FnNode<S> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&S) -> Result<S::Update, AgentError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl<S: StateRecord> Node<S> for FnNode<S> {
    fn id(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: &S) -> Result<S::Update, AgentError> {
        (self.f)(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state::{CounterState, CounterUpdate};

    #[tokio::test]
    async fn fn_node_runs_closure_against_state() {
        let node = FnNode::new("inc", |s: &CounterState| {
            Ok(CounterUpdate {
                count: Some(*s.count + 1),
                ..Default::default()
            })
        });
        assert_eq!(Node::<CounterState>::id(&node), "inc");
        let update = node.run(&CounterState::default()).await.unwrap();
        assert_eq!(update.count, Some(1));
    }
}
