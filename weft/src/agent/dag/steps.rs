//! Step names, the completion check and the router after it.

use crate::graph::FnNode;

use super::scheduling::is_complete;
use super::state::{DagState, DagUpdate};

pub(super) const PLAN: &str = "plan";
pub(super) const DISPATCH: &str = "dispatch";
pub(super) const CHECK_COMPLETION: &str = "check_completion";
pub(super) const SYNTHESIZE: &str = "synthesize";

/// Marks the run done once every planned node has a result.
pub(super) fn check_completion_node() -> FnNode<DagState> {
    FnNode::new(CHECK_COMPLETION, |s: &DagState| {
        let done = is_complete(&s.nodes, &s.results);
        tracing::debug!(
            tick = *s.tick,
            resolved = s.results.len(),
            total = s.nodes.len(),
            done,
            "dag progress"
        );
        Ok(DagUpdate {
            done: Some(done),
            ..Default::default()
        })
    })
}

pub(super) fn route_after_check(s: &DagState) -> String {
    if *s.done {
        SYNTHESIZE.to_string()
    } else {
        DISPATCH.to_string()
    }
}
