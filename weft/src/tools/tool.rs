use async_trait::async_trait;

use super::{ToolError, ToolSpec};

/// A single tool that pattern steps can call by name.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use weft::tools::{Tool, ToolError, ToolSpec};
///
/// struct Search;
///
/// #[async_trait]
/// impl Tool for Search {
///     fn name(&self) -> &str {
///         "search"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "search".to_string(),
///             description: Some("Web search".to_string()),
///             input_schema: serde_json::json!({"type": "object"}),
///         }
///     }
///
///     async fn call(&self, args: Value) -> Result<String, ToolError> {
///         let query = args
///             .get("query")
///             .and_then(Value::as_str)
///             .ok_or_else(|| ToolError::InvalidInput("missing query".into()))?;
///         Ok(format!("results for {}", query))
///     }
/// }
/// ```
///
/// # Interaction
///
/// - **ToolRegistry**: stores tools by name; rejects empty and duplicate names.
/// - **ToolInvoker**: calls tools with a timeout and converts failures to text.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry. Plans refer to tools by this name.
    fn name(&self) -> &str;

    /// Name, description and JSON schema of the arguments.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool. `args` is the JSON object from the plan after
    /// reference/placeholder substitution.
    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError>;
}
