//! `NODE` / `TOOL` / `ARGS` / `DEPENDS_ON` plan blocks.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::REASON_TOOL;

use super::{parse_args, strip_label, wrap_input, ParseError};

/// `#id` back-reference inside an argument string.
pub(crate) static REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_\-]+)").expect("static regex"));

/// One tool call in a DAG plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Unique within the plan; other nodes reference it as `#id`.
    pub id: String,
    /// Registered tool name, or `reason` for the solver reasoner.
    pub tool: String,
    /// String values may contain `#id` references to other nodes' results.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Ids that must have a result before this node runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            args,
            depends_on: Vec::new(),
        }
    }

    pub fn with_deps<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }
}

/// Every `#id` referenced from string values in `args`, in order of appearance.
pub fn references(args: &Map<String, Value>) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => {
                for cap in REF_PATTERN.captures_iter(s) {
                    let id = cap[1].to_string();
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }
    let mut out = Vec::new();
    args.values().for_each(|v| walk(v, &mut out));
    out
}

#[derive(Default)]
struct RawNode {
    id: String,
    tool: Option<String>,
    args: String,
    deps: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Other,
    Args,
}

fn parse_dep_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|d| {
            d.trim()
                .trim_matches(|c| c == '"' || c == '\'' || c == '#')
                .to_string()
        })
        .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("none"))
        .collect()
}

/// Parses plan blocks into task nodes.
///
/// - A `NODE:` line starts a node; `ARGS:` may continue over following lines.
/// - A node without `TOOL:` uses the reasoner tool.
/// - Duplicate ids keep the first declaration.
/// - Dependencies on unknown ids (or on the node itself) are dropped.
/// - `#id` references to known nodes in the arguments become implicit
///   dependencies.
///
/// Cycles are not rejected here; the dispatcher reports them as a stuck graph.
pub fn parse_dag_plan(text: &str) -> Result<Vec<TaskNode>, ParseError> {
    let mut raw_nodes: Vec<RawNode> = Vec::new();
    let mut field = Field::Other;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(id) = strip_label(trimmed, "NODE:") {
            raw_nodes.push(RawNode {
                id: id.trim_start_matches('#').to_string(),
                ..RawNode::default()
            });
            field = Field::Other;
            continue;
        }
        let Some(node) = raw_nodes.last_mut() else {
            continue;
        };
        if let Some(tool) = strip_label(trimmed, "TOOL:") {
            node.tool = Some(tool.to_string());
            field = Field::Other;
        } else if let Some(args) = strip_label(trimmed, "ARGS:") {
            node.args = args.to_string();
            field = Field::Args;
        } else if let Some(deps) = strip_label(trimmed, "DEPENDS_ON:") {
            node.deps = parse_dep_list(deps);
            field = Field::Other;
        } else if field == Field::Args && !trimmed.is_empty() {
            node.args.push('\n');
            node.args.push_str(trimmed);
        }
    }

    let mut seen = HashSet::new();
    let mut nodes: Vec<TaskNode> = Vec::new();
    for raw in raw_nodes {
        if raw.id.is_empty() {
            tracing::warn!("plan node without id skipped");
            continue;
        }
        if !seen.insert(raw.id.clone()) {
            tracing::warn!(node = %raw.id, "duplicate plan node id; keeping the first");
            continue;
        }
        let tool = raw
            .tool
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| REASON_TOOL.to_string());
        nodes.push(TaskNode {
            id: raw.id,
            tool,
            args: parse_args(&raw.args),
            depends_on: raw.deps,
        });
    }
    if nodes.is_empty() {
        return Err(ParseError::NoPlanNodes);
    }

    for node in &mut nodes {
        let mut deps: Vec<String> = Vec::new();
        for dep in node.depends_on.iter().cloned().chain(references(&node.args)) {
            if dep == node.id || deps.contains(&dep) {
                continue;
            }
            if seen.contains(&dep) {
                deps.push(dep);
            } else {
                tracing::warn!(node = %node.id, dependency = %dep, "unknown dependency dropped");
            }
        }
        node.depends_on = deps;
    }
    Ok(nodes)
}

/// Single reasoner node carrying the whole task.
pub fn fallback_dag_plan(task: &str) -> Vec<TaskNode> {
    vec![TaskNode::new(
        "task_1",
        REASON_TOOL,
        wrap_input(Value::String(task.to_string())),
    )]
}

pub fn dag_plan_or_fallback(text: &str, task: &str) -> Vec<TaskNode> {
    parse_dag_plan(text).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "plan unparsable; using single-node plan");
        fallback_dag_plan(task)
    })
}
