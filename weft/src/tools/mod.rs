//! Tools: capabilities the DAG dispatcher and placeholder planner can call.
//!
//! - [`Tool`]: one named capability, `call(args) -> text`.
//! - [`ToolRegistry`]: name → tool, validated at registration.
//! - [`FnTool`]: a tool from a closure.
//! - [`ToolInvoker`]: the call site used by patterns; turns every failure
//!   (unknown name, tool error, timeout) into a textual observation.

mod fn_tool;
mod invoker;
mod registry;
mod tool;

pub use fn_tool::FnTool;
pub use invoker::{ToolInvoker, REASON_TOOL};
pub use registry::{RegistryError, ToolRegistry};
pub use tool::Tool;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool description shown to the planner prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// Failure of a single tool call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("tool '{0}' not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}
