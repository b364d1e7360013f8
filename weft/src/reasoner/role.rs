//! Reasoner roles and the role → reasoner set.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Reasoner;

/// Which reasoner a step asks: the thinking model expands and synthesizes, the
/// evaluation model scores and judges, the solver answers tool-less requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReasonerRole {
    #[default]
    Thinking,
    Evaluation,
    Solver,
}

impl fmt::Display for ReasonerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReasonerRole::Thinking => "thinking",
            ReasonerRole::Evaluation => "evaluation",
            ReasonerRole::Solver => "solver",
        };
        f.write_str(s)
    }
}

impl FromStr for ReasonerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thinking" | "think" => Ok(ReasonerRole::Thinking),
            "evaluation" | "evaluate" | "eval" => Ok(ReasonerRole::Evaluation),
            "solver" | "solve" => Ok(ReasonerRole::Solver),
            other => Err(format!("unknown reasoner role: {}", other)),
        }
    }
}

/// A default reasoner plus optional per-role overrides.
#[derive(Clone)]
pub struct Reasoners {
    default: Arc<dyn Reasoner>,
    by_role: HashMap<ReasonerRole, Arc<dyn Reasoner>>,
}

impl Reasoners {
    /// Every role uses `default` until overridden.
    pub fn new(default: Arc<dyn Reasoner>) -> Self {
        Self {
            default,
            by_role: HashMap::new(),
        }
    }

    pub fn with_role(mut self, role: ReasonerRole, reasoner: Arc<dyn Reasoner>) -> Self {
        self.by_role.insert(role, reasoner);
        self
    }

    pub fn get(&self, role: ReasonerRole) -> Arc<dyn Reasoner> {
        self.by_role
            .get(&role)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }
}
