//! Shared fixtures: numeric tools and role-specific mock reasoners.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Map, Value};
use weft::{FnTool, MockReasoner, ReasonerRole, Reasoners, ToolError, ToolRegistry};

/// The `input` argument as a number; numeric strings are accepted.
pub fn input_number(args: &Value) -> Result<i64, ToolError> {
    match args.get("input") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ToolError::InvalidInput(format!("not an integer: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ToolError::InvalidInput(format!("not a number: {}", s))),
        _ => Err(ToolError::InvalidInput("missing input".into())),
    }
}

/// `constant` returns `input` unchanged; `double` doubles it; `fail` always errors.
pub fn number_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(FnTool::new("constant", "Return the input", |args| {
            input_number(&args).map(|n| n.to_string())
        }))
        .unwrap()
        .register(FnTool::new("double", "Double the input", |args| {
            input_number(&args).map(|n| (n * 2).to_string())
        }))
        .unwrap()
        .register(FnTool::new("fail", "Always fails", |_| {
            Err(ToolError::Execution("boom".into()))
        }))
        .unwrap();
    registry
}

pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// One default reasoner plus an optional evaluation reasoner.
pub fn reasoners(thinking: Arc<MockReasoner>, evaluation: Option<Arc<MockReasoner>>) -> Reasoners {
    let r = Reasoners::new(thinking);
    match evaluation {
        Some(e) => r.with_role(ReasonerRole::Evaluation, e),
        None => r,
    }
}
