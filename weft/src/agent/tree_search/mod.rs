//! Best-first tree search with UCB selection and backpropagation.
//!
//! Each cycle selects a leaf, asks the thinking reasoner for children, scores
//! them with the evaluation reasoner and backpropagates the scores. The run
//! ends after `max_iterations` cycles or when a terminal leaf is selected; the
//! answer is written from the highest-average path.

mod evaluate_node;
mod expand_node;
mod finalize_node;
mod runner;
mod state;
mod steps;
mod tree;

pub use runner::TreeSearchRunner;
pub use state::{TreeSearchState, TreeSearchUpdate};
pub use tree::{SearchNode, SearchTree};
