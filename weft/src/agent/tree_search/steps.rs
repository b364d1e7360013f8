//! Pure steps: select, backpropagate and check_budget.

use crate::error::AgentError;
use crate::graph::FnNode;

use super::state::{TreeSearchState, TreeSearchUpdate};

pub(super) const SELECT: &str = "select";
pub(super) const EXPAND: &str = "expand";
pub(super) const EVALUATE: &str = "evaluate";
pub(super) const BACKPROPAGATE: &str = "backpropagate";
pub(super) const CHECK_BUDGET: &str = "check_budget";
pub(super) const FINALIZE: &str = "finalize";

/// Picks the leaf to expand; a terminal leaf ends the search.
pub(super) fn select_node(exploration_weight: f64) -> FnNode<TreeSearchState> {
    FnNode::new(SELECT, move |s: &TreeSearchState| {
        let leaf = s.tree.select_leaf(exploration_weight);
        let terminal = s.tree.get().get(leaf).map(|n| n.terminal).unwrap_or(false);
        if terminal {
            tracing::debug!(leaf, "terminal leaf selected; search solved");
        }
        Ok(TreeSearchUpdate {
            selected: Some(Some(leaf)),
            solved: Some(terminal),
            ..Default::default()
        })
    })
}

pub(super) fn backpropagate_node() -> FnNode<TreeSearchState> {
    FnNode::new(BACKPROPAGATE, |s: &TreeSearchState| {
        let mut tree = s.tree.get().clone();
        for &child in s.pending.iter() {
            if tree.get(child).is_none() {
                return Err(AgentError::ExecutionFailed(format!(
                    "pending node {} is not in the tree",
                    child
                )));
            }
            tree.backpropagate(child);
        }
        Ok(TreeSearchUpdate {
            history: vec![format!(
                "backpropagated {:?}; root visits {}",
                s.pending.get(),
                tree.root().visits
            )],
            tree: Some(tree),
            pending: Some(Vec::new()),
            ..Default::default()
        })
    })
}

/// Counts the finished cycle; reaching `max_iterations` exhausts the budget.
pub(super) fn check_budget_node(max_iterations: usize) -> FnNode<TreeSearchState> {
    FnNode::new(CHECK_BUDGET, move |s: &TreeSearchState| {
        let iteration = *s.iteration + 1;
        let exhausted = iteration >= max_iterations;
        tracing::debug!(iteration, max_iterations, exhausted, "tree search cycle done");
        Ok(TreeSearchUpdate {
            iteration: Some(iteration),
            budget_exhausted: Some(exhausted),
            ..Default::default()
        })
    })
}

/// After `select`: finalize when solved, otherwise expand.
pub(super) fn route_after_select(s: &TreeSearchState) -> String {
    if *s.solved {
        FINALIZE.to_string()
    } else {
        EXPAND.to_string()
    }
}

/// After `check_budget`: finalize when exhausted, otherwise select again.
pub(super) fn route_after_budget(s: &TreeSearchState) -> String {
    if *s.budget_exhausted {
        FINALIZE.to_string()
    } else {
        SELECT.to_string()
    }
}
