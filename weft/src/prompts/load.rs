//! Load prompts from a directory of YAML files, falling back to the embedded
//! defaults per file and per step.

use std::path::{Path, PathBuf};

use super::{PatternPrompts, PromptSet, DAG, PLACEHOLDER, REFLEXION, TREE_SEARCH};

macro_rules! embed_prompt_yaml {
    ($name:literal) => {
        include_str!(concat!("../../prompts/", $name))
    };
}

/// `(pattern, file name, embedded default)`.
const PROMPT_FILES: [(&str, &str, &str); 4] = [
    (TREE_SEARCH, "tree_search.yaml", embed_prompt_yaml!("tree_search.yaml")),
    (DAG, "dag.yaml", embed_prompt_yaml!("dag.yaml")),
    (PLACEHOLDER, "placeholder.yaml", embed_prompt_yaml!("placeholder.yaml")),
    (REFLEXION, "reflexion.yaml", embed_prompt_yaml!("reflexion.yaml")),
];

const DEFAULT_PROMPTS_DIR: &str = "prompts";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
    #[error("no prompt for step '{step}' of pattern '{pattern}'")]
    MissingPrompt { pattern: String, step: String },
}

/// `dir` if given, else `PROMPTS_DIR`, else `./prompts`.
fn prompts_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(PathBuf::from).unwrap_or_else(|| {
        std::env::var("PROMPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROMPTS_DIR))
    })
}

fn read_yaml_file(dir: &Path, name: &str) -> Result<Option<PatternPrompts>, LoadError> {
    let path = dir.join(name);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    let prompts = serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(prompts))
}

/// Loads `tree_search.yaml`, `dag.yaml`, `placeholder.yaml` and `reflexion.yaml`
/// from `dir` (or `PROMPTS_DIR`, or `./prompts`) over the embedded defaults.
///
/// Missing files keep the defaults. Fails when the directory is missing or a
/// present file is not valid YAML.
pub fn load(dir: Option<&Path>) -> Result<PromptSet, LoadError> {
    let base = prompts_dir(dir);
    if !base.is_dir() {
        return Err(LoadError::DirNotFound(base.display().to_string()));
    }
    let mut set = default_from_embedded();
    for (pattern, file, _) in PROMPT_FILES {
        if let Some(prompts) = read_yaml_file(&base, file)? {
            tracing::debug!(pattern, path = %base.join(file).display(), "prompt overrides loaded");
            set.overlay(pattern, prompts);
        }
    }
    Ok(set)
}

/// Prompts parsed from the embedded `weft/prompts/*.yaml`.
pub fn default_from_embedded() -> PromptSet {
    let mut set = PromptSet::new();
    for (pattern, _, yaml) in PROMPT_FILES {
        let prompts: PatternPrompts = serde_yaml::from_str(yaml).unwrap_or_default();
        set.overlay(pattern, prompts);
    }
    set
}

/// [`load`], or the embedded defaults when the directory is unusable.
pub fn load_or_default(dir: Option<&Path>) -> PromptSet {
    load(dir).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using embedded prompts");
        default_from_embedded()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_cover_every_step() {
        let set = default_from_embedded();
        for (pattern, step) in [
            (TREE_SEARCH, "expand"),
            (TREE_SEARCH, "evaluate"),
            (TREE_SEARCH, "finalize"),
            (DAG, "plan"),
            (DAG, "synthesize"),
            (DAG, "solve"),
            (PLACEHOLDER, "plan"),
            (PLACEHOLDER, "solve"),
            (PLACEHOLDER, "integrate"),
            (REFLEXION, "attempt"),
            (REFLEXION, "evaluate"),
            (REFLEXION, "reflect"),
        ] {
            let t = set.get(pattern, step).unwrap();
            assert!(!t.system.is_empty(), "{}.{} system empty", pattern, step);
            assert!(!t.user.is_empty(), "{}.{} user empty", pattern, step);
        }
    }

    #[test]
    fn load_nonexistent_dir_returns_error() {
        let result = load(Some(Path::new("/nonexistent_prompts_dir_12345")));
        assert!(matches!(result, Err(LoadError::DirNotFound(_))));
    }

    #[test]
    fn file_overrides_only_its_steps() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("dag.yaml"),
            "plan:\n  system: \"From file.\"\n  user: \"{task}\"\n",
        )
        .unwrap();
        let set = load(Some(temp.path())).unwrap();
        assert_eq!(set.get(DAG, "plan").unwrap().system, "From file.");
        assert_eq!(
            set.get(DAG, "synthesize").unwrap(),
            default_from_embedded().get(DAG, "synthesize").unwrap()
        );
    }

    #[test]
    fn invalid_yaml_returns_parse_error() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("reflexion.yaml"), "attempt: [not closed").unwrap();
        assert!(matches!(
            load(Some(temp.path())),
            Err(LoadError::ParseYaml { .. })
        ));
    }

    #[test]
    fn load_or_default_falls_back_to_embedded() {
        let set = load_or_default(Some(Path::new("/nonexistent_prompts_dir_12345")));
        assert!(set.get(TREE_SEARCH, "expand").is_ok());
    }
}
