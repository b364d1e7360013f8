//! Step names and the pure `collect` step.

use crate::graph::FnNode;

use super::state::{PlaceholderState, PlaceholderUpdate};

pub(super) const PLAN: &str = "plan";
pub(super) const DISPATCH: &str = "dispatch";
pub(super) const COLLECT: &str = "collect";
pub(super) const INTEGRATE: &str = "integrate";

/// Fills the template. Placeholders still without a value are an error; the
/// partial fill is kept for the error report.
pub(super) fn collect_node() -> FnNode<PlaceholderState> {
    FnNode::new(COLLECT, |s: &PlaceholderState| {
        let filled = s.template.fill(&s.solved);
        let missing = s.template.missing(&s.solved);
        let error = if missing.is_empty() {
            None
        } else {
            tracing::warn!(missing = ?missing, "plan has unresolved placeholders");
            Some(Some(format!("unresolved placeholders: {}", missing.join(", "))))
        };
        Ok(PlaceholderUpdate {
            filled: Some(Some(filled)),
            error,
            ..Default::default()
        })
    })
}
