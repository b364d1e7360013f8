//! `PLAN:` template followed by `SOLVER` / `TOOL` / `PARAMS` requests.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::tools::REASON_TOOL;

use super::{parse_args, strip_label, wrap_input, ParseError};

/// `{name}` placeholder token.
pub(crate) static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"));

/// Distinct placeholder names in `text`, in order of first appearance.
pub fn placeholders_in(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in PLACEHOLDER_PATTERN.captures_iter(text) {
        let name = cap[1].to_string();
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// A deferred tool call whose result fills `{placeholder}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRequest {
    pub placeholder: String,
    pub tool: String,
    /// String values may embed `{other_placeholder}` tokens.
    pub params: Map<String, Value>,
}

impl SolverRequest {
    pub fn new(
        placeholder: impl Into<String>,
        tool: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            placeholder: placeholder.into(),
            tool: tool.into(),
            params,
        }
    }

    /// Placeholders referenced from string parameters.
    pub fn references(&self) -> Vec<String> {
        fn walk(value: &Value, out: &mut Vec<String>) {
            match value {
                Value::String(s) => {
                    for name in placeholders_in(s) {
                        if !out.contains(&name) {
                            out.push(name);
                        }
                    }
                }
                Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
                Value::Object(map) => map.values().for_each(|v| walk(v, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        self.params.values().for_each(|v| walk(v, &mut out));
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderPlan {
    pub template: String,
    pub requests: Vec<SolverRequest>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Plan,
    Params,
    Request,
}

struct RawRequest {
    placeholder: String,
    tool: Option<String>,
    params: String,
}

/// Parses the plan reply.
///
/// The template runs from `PLAN:` to the first `SOLVER:` line. Placeholder
/// names may be written with or without braces. Requests without `TOOL:` use
/// the reasoner tool; a repeated placeholder keeps its first request.
pub fn parse_placeholder_plan(text: &str) -> Result<PlaceholderPlan, ParseError> {
    let mut template: Option<String> = None;
    let mut raw: Vec<RawRequest> = Vec::new();
    let mut section = Section::Preamble;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(plan) = strip_label(trimmed, "PLAN:") {
            template = Some(plan.to_string());
            section = Section::Plan;
        } else if let Some(name) = strip_label(trimmed, "SOLVER:") {
            raw.push(RawRequest {
                placeholder: name
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .trim()
                    .to_string(),
                tool: None,
                params: String::new(),
            });
            section = Section::Request;
        } else if let Some(request) = raw.last_mut() {
            if let Some(tool) = strip_label(trimmed, "TOOL:") {
                request.tool = Some(tool.to_string());
                section = Section::Request;
            } else if let Some(params) = strip_label(trimmed, "PARAMS:") {
                request.params = params.to_string();
                section = Section::Params;
            } else if section == Section::Params && !trimmed.is_empty() {
                request.params.push('\n');
                request.params.push_str(trimmed);
            }
        } else if section == Section::Plan && !trimmed.is_empty() {
            if let Some(t) = template.as_mut() {
                t.push('\n');
                t.push_str(trimmed);
            }
        }
    }

    let template = template
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingTemplate)?;
    let mut seen = HashSet::new();
    let mut requests = Vec::new();
    for r in raw {
        if r.placeholder.is_empty() {
            continue;
        }
        if !seen.insert(r.placeholder.clone()) {
            tracing::warn!(placeholder = %r.placeholder, "duplicate solver request; keeping the first");
            continue;
        }
        requests.push(SolverRequest {
            placeholder: r.placeholder,
            tool: r
                .tool
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| REASON_TOOL.to_string()),
            params: parse_args(&r.params),
        });
    }
    Ok(PlaceholderPlan { template, requests })
}

/// `{answer}` resolved by one reasoner request carrying the task.
pub fn fallback_placeholder_plan(task: &str) -> PlaceholderPlan {
    PlaceholderPlan {
        template: "{answer}".to_string(),
        requests: vec![SolverRequest::new(
            "answer",
            REASON_TOOL,
            wrap_input(Value::String(task.to_string())),
        )],
    }
}

pub fn placeholder_plan_or_fallback(text: &str, task: &str) -> PlaceholderPlan {
    parse_placeholder_plan(text).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "plan unparsable; using single-request plan");
        fallback_placeholder_plan(task)
    })
}
