//! Run configuration: budgets, concurrency, timeouts and reasoner roles.
//!
//! Precedence, lowest first: built-in defaults, a TOML file, `.env`, then
//! `WEFT_*` environment variables. [`WeftConfig::load`] does all of it and
//! validates the result.
//!
//! ```toml
//! [executor]
//! max_steps = 200
//!
//! [tree_search]
//! max_iterations = 8
//! exploration_weight = 1.0
//!
//! [dag]
//! max_concurrency = 8
//! call_timeout_secs = 20
//! max_nodes = 32
//! ```
//!
//! `executor.max_steps` is a safety ceiling; each runner raises it to what its
//! own budget needs, so an exhausted pattern budget still finalizes.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{RetryPolicy, DEFAULT_MAX_STEPS};
use crate::reasoner::ReasonerRole;

const APP_NAME: &str = "weft";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "WEFT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Hard ceiling on executed steps per run, independent of pattern budgets.
    pub max_steps: usize,
    /// Retries for transient step failures; 0 disables retry.
    pub retry_attempts: usize,
    pub retry_interval_ms: u64,
    /// Wrap every step in the logging middleware.
    pub verbose: bool,
}

impl ExecutorConfig {
    /// Fixed-interval retry of transient step failures, or none.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.retry_attempts {
            0 => RetryPolicy::None,
            n => RetryPolicy::fixed(n, Duration::from_millis(self.retry_interval_ms)),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            retry_attempts: 0,
            retry_interval_ms: 500,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Per-call timeout; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSearchConfig {
    pub max_iterations: usize,
    /// `C` in the UCB formula.
    pub exploration_weight: f64,
    pub num_expansions: usize,
}

impl TreeSearchConfig {
    /// Steps for `max_iterations` full cycles (select, expand, evaluate,
    /// backpropagate, check_budget) plus the final select and finalize.
    pub fn budget_steps(&self) -> usize {
        self.max_iterations.saturating_mul(5).saturating_add(2)
    }
}

impl Default for TreeSearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            exploration_weight: std::f64::consts::SQRT_2,
            num_expansions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagConfig {
    /// Tool calls running at once within one tick.
    pub max_concurrency: usize,
    /// Per-call timeout; 0 disables it.
    pub call_timeout_secs: u64,
    /// Largest plan accepted; bigger plans fail at the plan step.
    pub max_nodes: usize,
}

impl DagConfig {
    /// Every tick finishes at least one node, so a plan of `max_nodes` needs
    /// at most that many dispatch/check pairs between plan and synthesize.
    pub fn budget_steps(&self) -> usize {
        self.max_nodes.saturating_mul(2).saturating_add(2)
    }
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            call_timeout_secs: 30,
            max_nodes: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Reasoner answering `reason` requests and requests naming no known tool.
    pub solver_role: ReasonerRole,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            solver_role: ReasonerRole::Solver,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub max_trials: usize,
}

impl TrialConfig {
    /// Attempt and evaluate per trial, a reflect between trials, then finalize.
    pub fn budget_steps(&self) -> usize {
        self.max_trials.saturating_mul(3).saturating_add(1)
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self { max_trials: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    pub executor: ExecutorConfig,
    pub reasoner: ReasonerConfig,
    pub tree_search: TreeSearchConfig,
    pub dag: DagConfig,
    pub placeholder: PlaceholderConfig,
    pub trials: TrialConfig,
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn set_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(key) {
        *slot = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: key.to_string(),
            value,
        })?;
    }
    Ok(())
}

impl WeftConfig {
    /// Defaults, then the TOML file, then `.env`, then `WEFT_*` variables.
    ///
    /// The file is `path` if given (it must exist), else `$WEFT_CONFIG` (must
    /// exist), else `<config dir>/weft/config.toml` when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
        let mut config = match explicit {
            Some(p) if !p.is_file() => return Err(ConfigError::NotFound(p.display().to_string())),
            Some(p) => Self::from_file(&p)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        if let Err(e) = dotenv::dotenv() {
            tracing::trace!(error = %e, "no .env applied");
        }
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies `WEFT_*` overrides read through `lookup`.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        set_parsed(&lookup, "WEFT_MAX_STEPS", &mut self.executor.max_steps)?;
        set_parsed(&lookup, "WEFT_RETRY_ATTEMPTS", &mut self.executor.retry_attempts)?;
        set_parsed(&lookup, "WEFT_RETRY_INTERVAL_MS", &mut self.executor.retry_interval_ms)?;
        set_parsed(&lookup, "WEFT_VERBOSE", &mut self.executor.verbose)?;
        set_parsed(&lookup, "WEFT_REASONER_TIMEOUT_SECS", &mut self.reasoner.timeout_secs)?;
        set_parsed(&lookup, "WEFT_MAX_ITERATIONS", &mut self.tree_search.max_iterations)?;
        set_parsed(
            &lookup,
            "WEFT_EXPLORATION_WEIGHT",
            &mut self.tree_search.exploration_weight,
        )?;
        set_parsed(&lookup, "WEFT_NUM_EXPANSIONS", &mut self.tree_search.num_expansions)?;
        set_parsed(&lookup, "WEFT_MAX_CONCURRENCY", &mut self.dag.max_concurrency)?;
        set_parsed(&lookup, "WEFT_CALL_TIMEOUT_SECS", &mut self.dag.call_timeout_secs)?;
        set_parsed(&lookup, "WEFT_MAX_NODES", &mut self.dag.max_nodes)?;
        set_parsed(&lookup, "WEFT_SOLVER_ROLE", &mut self.placeholder.solver_role)?;
        set_parsed(&lookup, "WEFT_MAX_TRIALS", &mut self.trials.max_trials)?;
        Ok(())
    }

    /// Rejects zero budgets and a negative or non-finite exploration weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("executor.max_steps", self.executor.max_steps),
            ("tree_search.max_iterations", self.tree_search.max_iterations),
            ("tree_search.num_expansions", self.tree_search.num_expansions),
            ("dag.max_concurrency", self.dag.max_concurrency),
            ("dag.max_nodes", self.dag.max_nodes),
            ("trials.max_trials", self.trials.max_trials),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
        }
        let c = self.tree_search.exploration_weight;
        if !c.is_finite() || c < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tree_search.exploration_weight must be a finite non-negative number, got {}",
                c
            )));
        }
        Ok(())
    }

    pub fn reasoner_timeout(&self) -> Option<Duration> {
        secs(self.reasoner.timeout_secs)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        secs(self.dag.call_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.executor.retry_policy()
    }
}

/// `$XDG_CONFIG_HOME/weft/config.toml` (or the platform config dir).
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILE))
}
