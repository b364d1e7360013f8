//! Plan templates, parameter substitution and request ordering.

use serde_json::{Map, Value};

use crate::channels::WriteOnceMap;
use crate::parse::{placeholders_in, SolverRequest, PLACEHOLDER_PATTERN};

/// Answer text with `{name}` placeholders. Read-only; filling returns a new string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanTemplate(String);

impl PlanTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        placeholders_in(&self.0)
    }

    /// Copy of the template with every solved placeholder replaced.
    pub fn fill(&self, solved: &WriteOnceMap<String>) -> String {
        substitute(&self.0, solved)
    }

    /// Placeholders that have no value yet.
    pub fn missing(&self, solved: &WriteOnceMap<String>) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|p| !solved.contains_key(p))
            .collect()
    }
}

fn substitute(text: &str, solved: &WriteOnceMap<String>) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            solved
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replaces solved `{name}` tokens in string parameters; unknown and unsolved
/// tokens stay literal. Pure: the same inputs always give the same output.
pub fn resolve_params(params: &Map<String, Value>, solved: &WriteOnceMap<String>) -> Map<String, Value> {
    fn resolve(value: &Value, solved: &WriteOnceMap<String>) -> Value {
        match value {
            Value::String(s) => Value::String(substitute(s, solved)),
            Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, solved)).collect()),
            Value::Object(map) => Value::Object(resolve_params(map, solved)),
            other => other.clone(),
        }
    }
    params
        .iter()
        .map(|(k, v)| (k.clone(), resolve(v, solved)))
        .collect()
}

/// Groups request indices into waves: a request runs once every placeholder
/// it references that another request declares has been solved in an earlier
/// wave. Waves keep declaration order.
///
/// References to undeclared placeholders are ignored. When the remaining
/// requests wait on each other, the earliest-declared one runs alone with its
/// cyclic references left literal.
pub fn resolution_waves(requests: &[SolverRequest]) -> Vec<Vec<usize>> {
    let declared: Vec<&str> = requests.iter().map(|r| r.placeholder.as_str()).collect();
    let deps: Vec<Vec<usize>> = requests
        .iter()
        .enumerate()
        .map(|(i, r)| {
            r.references()
                .iter()
                .filter_map(|name| declared.iter().position(|d| d == name))
                .filter(|&j| j != i)
                .collect()
        })
        .collect();

    let mut done = vec![false; requests.len()];
    let mut waves = Vec::new();
    while done.iter().any(|d| !d) {
        let mut wave: Vec<usize> = (0..requests.len())
            .filter(|&i| !done[i] && deps[i].iter().all(|&j| done[j]))
            .collect();
        if wave.is_empty() {
            if let Some(first) = (0..requests.len()).find(|&i| !done[i]) {
                tracing::warn!(
                    placeholder = %requests[first].placeholder,
                    "placeholder requests reference each other; resolving with literal references"
                );
                wave.push(first);
            }
        }
        for &i in &wave {
            done[i] = true;
        }
        waves.push(wave);
    }
    waves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;
    use serde_json::json;

    fn solved(pairs: &[(&str, &str)]) -> WriteOnceMap<String> {
        let mut map = WriteOnceMap::new();
        map.apply(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect());
        map
    }

    fn request(name: &str, query: &str) -> SolverRequest {
        SolverRequest::new(name, "search", json!({"q": query}).as_object().cloned().unwrap())
    }

    /// **Scenario**: "CEO is {ceo}" with ceo solved as "Jane Doe" fills to "CEO is Jane Doe".
    #[test]
    fn fill_replaces_solved_placeholders() {
        let t = PlanTemplate::new("CEO is {ceo}");
        let s = solved(&[("ceo", "Jane Doe")]);
        assert_eq!(t.fill(&s), "CEO is Jane Doe");
        assert_eq!(t.as_str(), "CEO is {ceo}");
        assert!(t.missing(&s).is_empty());
    }

    #[test]
    fn missing_lists_unsolved_in_order() {
        let t = PlanTemplate::new("{b} then {a} then {b}");
        assert_eq!(t.missing(&solved(&[])), vec!["b", "a"]);
        assert_eq!(t.fill(&solved(&[("a", "1")])), "{b} then 1 then {b}");
    }

    /// **Scenario**: Resolving parameters twice against the same solved set gives the same result.
    #[test]
    fn resolution_is_idempotent() {
        let params = json!({"q": "CEO of {company} in {year}", "n": 1, "tags": ["{company}"]})
            .as_object()
            .cloned()
            .unwrap();
        let s = solved(&[("company", "Acme")]);
        let once = resolve_params(&params, &s);
        assert_eq!(once["q"], "CEO of Acme in {year}");
        assert_eq!(once["tags"][0], "Acme");
        assert_eq!(resolve_params(&once, &s), once);
        assert_eq!(resolve_params(&params, &s), once);
    }

    #[test]
    fn later_declared_dependency_runs_first() {
        let reqs = vec![request("ceo", "CEO of {company}"), request("company", "largest retailer")];
        assert_eq!(resolution_waves(&reqs), vec![vec![1], vec![0]]);
    }

    #[test]
    fn independent_requests_share_a_wave() {
        let reqs = vec![
            request("a", "x"),
            request("b", "y {undeclared}"),
            request("c", "{a} and {b}"),
        ];
        assert_eq!(resolution_waves(&reqs), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn cycles_are_broken_by_declaration_order() {
        let reqs = vec![request("a", "{b}"), request("b", "{a}"), request("c", "{c}")];
        assert_eq!(resolution_waves(&reqs), vec![vec![2], vec![0], vec![1]]);
    }
}
