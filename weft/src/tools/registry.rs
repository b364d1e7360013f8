use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::{Tool, ToolError, ToolSpec, REASON_TOOL};

/// Registration-time validation failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("tool name must not be empty")]
    EmptyName,
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
    #[error("tool name '{0}' is reserved")]
    Reserved(String),
}

/// Registry mapping tool names to tools.
///
/// Lookups of unknown names return [`ToolError::NotFound`]; the invoker turns
/// that into a textual observation.
///
/// ```
/// use weft::tools::{FnTool, ToolRegistry};
///
/// let mut registry = ToolRegistry::new();
/// registry
///     .register(FnTool::new("echo", "Echo args", |args| Ok(args.to_string())))
///     .unwrap();
/// assert!(registry.get("echo").is_ok());
/// assert!(registry.get("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`. The name must be non-empty, unique, and not the
    /// reserved solver name.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<&mut Self, RegistryError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, RegistryError> {
        let name = tool.name().trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name == REASON_TOOL {
            return Err(RegistryError::Reserved(name));
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name.trim())
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name.trim())
    }

    /// Specs of all tools, sorted by name.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// One `- name: description` line per tool, for planner prompts.
    pub fn describe(&self) -> String {
        if self.tools.is_empty() {
            return "(no tools registered)".to_string();
        }
        self.list()
            .into_iter()
            .map(|s| match s.description {
                Some(d) => format!("- {}: {}", s.name, d),
                None => format!("- {}", s.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
