//! Logging helpers for graph execution.
//!
//! Structured `tracing` events for run start/end, each step, state merges and
//! error routing. Called by the `CompiledStateGraph` run loop.

use std::fmt::Debug;

pub fn log_graph_start(first_node: &str, max_steps: usize) {
    tracing::info!(first_node, max_steps, "Starting graph execution");
}

pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id, step, "Starting node execution");
}

/// Logs the input state of a step (debug level; states can be large).
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id, state = ?state, "Node execution: state");
}

pub fn log_node_complete(node_id: &str, next: &str) {
    tracing::debug!(node_id, next, "Node execution complete");
}

pub fn log_state_update(node_id: &str) {
    tracing::debug!(node_id, "State updated");
}

pub fn log_error_routed(from: &str, error_node: Option<&str>, error: &str) {
    tracing::warn!(from, error_node, error, "state.error set; routing to error node");
}

pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

pub fn log_graph_error(error: &super::GraphError) {
    tracing::error!(%error, "Graph execution error");
}
