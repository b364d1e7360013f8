//! Parsers for the reasoner's line-oriented output formats.
//!
//! Each parser returns `Result<_, ParseError>`; each has a companion
//! `*_or_fallback` (or `*_or_default`) that never fails, so a malformed
//! reasoner reply degrades a run instead of aborting it.
//!
//! | format | parser | fallback |
//! |---|---|---|
//! | `EXPANSION n` / `ACTION:` / `STATE:` | [`parse_expansions`] | up to two placeholder children |
//! | `SCORE: <float>` | [`parse_score`] | [`NEUTRAL_SCORE`] |
//! | `NODE:` / `TOOL:` / `ARGS:` / `DEPENDS_ON:` | [`parse_dag_plan`] | single `reason` node |
//! | `PLAN:` then `SOLVER:` / `TOOL:` / `PARAMS:` | [`parse_placeholder_plan`] | `{answer}` with one request |
//! | a line with `SUCCESS` or `FAILURE` | [`parse_verdict`] | [`Verdict::Failure`] |

mod dag_plan;
mod expansion;
mod placeholder_plan;
mod score;
mod verdict;

pub use dag_plan::{dag_plan_or_fallback, fallback_dag_plan, parse_dag_plan, references, TaskNode};
pub use expansion::{expansions_or_fallback, fallback_expansions, parse_expansions, Expansion};
pub use placeholder_plan::{
    fallback_placeholder_plan, parse_placeholder_plan, placeholder_plan_or_fallback,
    placeholders_in, PlaceholderPlan, SolverRequest,
};
pub use score::{parse_score, score_or_default, NEUTRAL_SCORE};
pub use verdict::{parse_verdict, verdict_or_failure, Verdict};

pub(crate) use dag_plan::REF_PATTERN;
pub(crate) use placeholder_plan::PLACEHOLDER_PATTERN;

use serde_json::{Map, Value};
use thiserror::Error;

/// Reply text did not match the expected format.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("no ACTION/STATE expansion blocks found")]
    NoExpansions,
    #[error("no SCORE line found")]
    MissingScore,
    #[error("invalid score '{0}'")]
    InvalidScore(String),
    #[error("no NODE blocks found")]
    NoPlanNodes,
    #[error("no PLAN line found")]
    MissingTemplate,
    #[error("no SUCCESS or FAILURE verdict found")]
    NoVerdict,
}

/// Returns the text after `label` when `line` starts with it, ignoring ASCII
/// case and leading list markers.
pub(crate) fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let line = line.trim_start_matches(|c: char| c == '-' || c == '*' || c.is_whitespace());
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        line.get(label.len()..).map(str::trim)
    } else {
        None
    }
}

/// Parses a JSON argument object. Non-object JSON and unparsable text are
/// wrapped as `{"input": ...}`.
pub(crate) fn parse_args(raw: &str) -> Map<String, Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => wrap_input(other),
        Err(e) => {
            tracing::debug!(error = %e, "arguments are not JSON; passing as text");
            wrap_input(Value::String(raw.to_string()))
        }
    }
}

pub(crate) fn wrap_input(value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("input".to_string(), value);
    map
}
