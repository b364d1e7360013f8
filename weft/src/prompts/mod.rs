//! Prompt templates for the pattern steps.
//!
//! Default text lives in `weft/prompts/*.yaml` (one file per pattern, one
//! entry per step) and is embedded at compile time; see [`load`],
//! [`load_or_default`] and [`default_from_embedded`].

mod load;

pub use load::{default_from_embedded, load, load_or_default, LoadError};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parse::PLACEHOLDER_PATTERN;

pub const TREE_SEARCH: &str = "tree_search";
pub const DAG: &str = "dag";
pub const PLACEHOLDER: &str = "placeholder";
pub const REFLEXION: &str = "reflexion";

/// System prompt plus a user prompt with `{field}` slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub user: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Replaces `{key}` for each supplied key in one pass; other braces are
    /// left as written, so values containing `{...}` are not re-expanded.
    ///
    /// ```
    /// use weft::prompts::PromptTemplate;
    ///
    /// let t = PromptTemplate::new("sys", r#"Task: {task} as {"json": true} {other}"#);
    /// let r = t.render(&[("task", "add {x}")]);
    /// assert_eq!(r.user, r#"Task: add {x} as {"json": true} {other}"#);
    /// ```
    pub fn render(&self, vars: &[(&str, &str)]) -> PromptTemplate {
        PromptTemplate {
            system: fill(&self.system, vars),
            user: fill(&self.user, vars),
        }
    }
}

fn fill(text: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Steps of one pattern, keyed by step name.
pub type PatternPrompts = BTreeMap<String, PromptTemplate>;

/// All prompts, keyed by pattern name and then step name.
#[derive(Debug, Clone, Default)]
pub struct PromptSet {
    patterns: BTreeMap<String, PatternPrompts>,
}

impl PromptSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pattern: &str, step: &str) -> Result<&PromptTemplate, LoadError> {
        self.patterns
            .get(pattern)
            .and_then(|steps| steps.get(step))
            .ok_or_else(|| LoadError::MissingPrompt {
                pattern: pattern.to_string(),
                step: step.to_string(),
            })
    }

    /// Owned copy of a template, for building step nodes.
    pub fn template(&self, pattern: &str, step: &str) -> Result<PromptTemplate, LoadError> {
        self.get(pattern, step).cloned()
    }

    pub fn insert(&mut self, pattern: &str, step: &str, template: PromptTemplate) {
        self.patterns
            .entry(pattern.to_string())
            .or_default()
            .insert(step.to_string(), template);
    }

    /// Steps in `prompts` replace the same steps of `pattern`; others are kept.
    pub(crate) fn overlay(&mut self, pattern: &str, prompts: PatternPrompts) {
        let entry = self.patterns.entry(pattern.to_string()).or_default();
        entry.extend(prompts);
    }
}
