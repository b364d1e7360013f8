//! Readiness, completion and `#id` reference resolution over a plan.

use serde_json::{Map, Value};

use crate::channels::WriteOnceMap;
use crate::parse::{TaskNode, REF_PATTERN};

/// Nodes without a result whose dependencies all have results, in plan order.
pub fn ready_nodes<'a>(nodes: &'a [TaskNode], results: &WriteOnceMap<String>) -> Vec<&'a TaskNode> {
    nodes
        .iter()
        .filter(|n| !results.contains_key(&n.id))
        .filter(|n| n.depends_on.iter().all(|d| results.contains_key(d)))
        .collect()
}

/// Every planned node has a result.
pub fn is_complete(nodes: &[TaskNode], results: &WriteOnceMap<String>) -> bool {
    nodes.iter().all(|n| results.contains_key(&n.id))
}

/// Ids still waiting for a result, in plan order.
pub fn unresolved(nodes: &[TaskNode], results: &WriteOnceMap<String>) -> Vec<String> {
    nodes
        .iter()
        .filter(|n| !results.contains_key(&n.id))
        .map(|n| n.id.clone())
        .collect()
}

/// Substitutes `#id` references in string values with recorded results.
///
/// A value that is exactly `#id` becomes the result; `#id` inside longer text
/// is replaced inline. References to ids without a result stay literal.
pub fn resolve_args(args: &Map<String, Value>, results: &WriteOnceMap<String>) -> Map<String, Value> {
    args.iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, results)))
        .collect()
}

fn resolve_value(value: &Value, results: &WriteOnceMap<String>) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_text(s, results)),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, results)).collect()),
        Value::Object(map) => Value::Object(resolve_args(map, results)),
        other => other.clone(),
    }
}

fn resolve_text(text: &str, results: &WriteOnceMap<String>) -> String {
    let trimmed = text.trim();
    if let Some(id) = trimmed.strip_prefix('#') {
        if let Some(result) = results.get(id) {
            return result.clone();
        }
    }
    REF_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            results
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
