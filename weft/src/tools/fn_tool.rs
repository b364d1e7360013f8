//! FnTool: a tool backed by a synchronous closure.

use async_trait::async_trait;
use serde_json::Value;

use super::{Tool, ToolError, ToolSpec};

type ToolFn = Box<dyn Fn(Value) -> Result<String, ToolError> + Send + Sync>;

pub struct FnTool {
    name: String,
    description: String,
    input_schema: Value,
    f: ToolFn,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object"}),
            f: Box::new(f),
        }
    }

    pub fn with_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema.clone(),
        }
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        (self.f)(args)
    }
}
