//! Dependency-graph tool dispatch.
//!
//! The planner writes tool calls with declared dependencies; each dispatch
//! tick runs every node whose dependencies have results, concurrently and
//! under a per-call timeout. `#id` in an argument string is replaced by that
//! node's result. Tool failures are recorded as `Error: ...` results, so a
//! failed node still counts as resolved.

mod dispatch_node;
mod plan_node;
mod runner;
mod scheduling;
mod state;
mod steps;
mod synthesize_node;

pub use runner::DagRunner;
pub use scheduling::{is_complete, ready_nodes, resolve_args, unresolved};
pub use state::{DagState, DagUpdate};
