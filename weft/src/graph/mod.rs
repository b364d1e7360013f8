//! State graph: named steps, static and conditional edges, cyclic execution.
//!
//! `StateGraph` builds, `compile` validates, `CompiledStateGraph` runs.

mod compile_error;
mod compiled;
mod conditional;
mod fn_node;
mod graph_error;
mod logging;
mod logging_middleware;
mod node;
mod node_middleware;
mod retry;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use fn_node::FnNode;
pub use graph_error::GraphError;
pub use logging::{
    log_error_routed, log_graph_complete, log_graph_error, log_graph_start, log_node_complete,
    log_node_start, log_node_state, log_state_update,
};
pub use logging_middleware::LoggingNodeMiddleware;
pub use node::Node;
pub use node_middleware::{InnerRun, NodeFuture, NodeMiddleware};
pub use retry::RetryPolicy;
pub use run_context::RunContext;
pub use state_graph::{StateGraph, DEFAULT_MAX_STEPS, END, START};
