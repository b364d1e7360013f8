//! Integration tests: UCB tree search end to end with mock reasoners.

mod common;
mod init_logging;

use std::sync::Arc;

use weft::agent::tree_search::SearchTree;
use weft::config::WeftConfig;
use weft::{MockReasoner, PatternDeps, PatternEvent, StreamEvent, TreeSearchRunner};

const TWO_CHILDREN: &str = "EXPANSION 1\nACTION: try a\nSTATE: after a\n\nEXPANSION 2\nACTION: try b\nSTATE: after b";

fn deps(thinking: Arc<MockReasoner>, evaluation: Arc<MockReasoner>, iterations: usize) -> PatternDeps {
    let mut config = WeftConfig::default();
    config.tree_search.max_iterations = iterations;
    config.tree_search.num_expansions = 2;
    PatternDeps::new(common::reasoners(thinking, Some(evaluation))).with_config(config)
}

fn is_expand(system: &str) -> bool {
    system.contains("propose up to")
}

/// **Scenario**: One cycle, two children scored 0.3 and 0.7: the root ends with
/// two visits and value 1.0, and the answer is written from the 0.7 child.
#[tokio::test]
async fn one_cycle_scores_backpropagate_and_best_child_is_finalized() {
    let thinking = Arc::new(MockReasoner::scripted([TWO_CHILDREN, "answer from b"]));
    let evaluation = Arc::new(MockReasoner::scripted(["SCORE: 0.3", "SCORE: 0.7"]));
    let runner = TreeSearchRunner::new(&deps(thinking.clone(), evaluation, 1)).unwrap();

    let state = runner.invoke("pick a route").await.unwrap();

    let root = state.tree.root();
    assert_eq!(root.visits, 2);
    assert!((root.value - 1.0).abs() < 1e-9);
    assert_eq!(state.tree.best_path(), vec![SearchTree::ROOT, 2]);
    assert_eq!(state.answer.as_deref(), Some("answer from b"));

    let calls = thinking.calls();
    let (_, finalize_user) = calls.last().unwrap();
    assert!(finalize_user.contains("try b -> after b"), "{}", finalize_user);
    assert!(!finalize_user.contains("try a"), "{}", finalize_user);
}

/// **Scenario**: With no terminal candidate, N iterations make exactly N expand calls.
#[tokio::test]
async fn n_iterations_make_n_expansions() {
    let thinking = Arc::new(MockReasoner::from_fn(|system, _| {
        Ok(if is_expand(system) {
            TWO_CHILDREN.to_string()
        } else {
            "done".to_string()
        })
    }));
    let evaluation = Arc::new(MockReasoner::always("SCORE: 0.5"));
    let runner = TreeSearchRunner::new(&deps(thinking.clone(), evaluation.clone(), 4)).unwrap();

    let state = runner.invoke("task").await.unwrap();

    let expands = thinking.calls().iter().filter(|(s, _)| is_expand(s)).count();
    assert_eq!(expands, 4);
    assert_eq!(*state.iteration, 4);
    assert!(*state.budget_exhausted);
    assert_eq!(state.tree.len(), 1 + 4 * 2);
    assert_eq!(evaluation.call_count(), 8);
    assert_eq!(state.tree.root().visits, 8);
}

/// **Scenario**: Twenty iterations need more steps than the default executor
/// ceiling; the runner raises it so the budget, not the ceiling, ends the run.
#[tokio::test]
async fn large_iteration_budget_still_finalizes() {
    let thinking = Arc::new(MockReasoner::from_fn(|system, _| {
        Ok(if is_expand(system) {
            TWO_CHILDREN.to_string()
        } else {
            "best effort".to_string()
        })
    }));
    let evaluation = Arc::new(MockReasoner::always("SCORE: 0.5"));
    let deps = deps(thinking.clone(), evaluation, 20);
    deps.config.validate().unwrap();
    assert_eq!(deps.config.executor.max_steps, weft::graph::DEFAULT_MAX_STEPS);
    let runner = TreeSearchRunner::new(&deps).unwrap();

    let state = runner.invoke("task").await.unwrap();

    assert_eq!(*state.iteration, 20);
    assert!(*state.budget_exhausted);
    assert_eq!(state.answer.as_deref(), Some("best effort"));
    let expands = thinking.calls().iter().filter(|(s, _)| is_expand(s)).count();
    assert_eq!(expands, 20);
}

/// **Scenario**: A FINAL candidate is selected on the next cycle and ends the search early.
#[tokio::test]
async fn terminal_candidate_solves_search() {
    let thinking = Arc::new(MockReasoner::scripted([
        "ACTION: finish\nSTATE: FINAL 42",
        "The answer is 42",
    ]));
    let evaluation = Arc::new(MockReasoner::always("SCORE: 0.9"));
    let runner = TreeSearchRunner::new(&deps(thinking.clone(), evaluation, 10)).unwrap();

    let state = runner.invoke("compute").await.unwrap();

    assert!(*state.solved);
    assert_eq!(*state.selected, Some(1));
    assert_eq!(state.answer.as_deref(), Some("The answer is 42"));
    assert_eq!(thinking.call_count(), 2);
}

/// **Scenario**: A failing evaluation reasoner routes to finalize, which reports
/// the error with the best partial path.
#[tokio::test]
async fn reasoner_failure_produces_error_report() {
    let thinking = Arc::new(MockReasoner::scripted([TWO_CHILDREN]));
    let evaluation = Arc::new(MockReasoner::failing("provider down"));
    let runner = TreeSearchRunner::new(&deps(thinking, evaluation, 3)).unwrap();

    let state = runner.invoke("task").await.unwrap();

    let answer = state.answer.as_deref().unwrap_or_default();
    assert!(answer.starts_with("Error: evaluate:"), "{}", answer);
    assert!(answer.contains("Best partial path:"), "{}", answer);
}

#[tokio::test]
async fn stream_reports_expansion_and_scores() {
    let thinking = Arc::new(MockReasoner::scripted([TWO_CHILDREN, "ok"]));
    let evaluation = Arc::new(MockReasoner::scripted(["SCORE: 0.3", "SCORE: 0.7"]));
    let runner = TreeSearchRunner::new(&deps(thinking, evaluation, 1)).unwrap();

    let mut custom = Vec::new();
    runner
        .stream_with_callback("task", |event| {
            if let StreamEvent::Custom(e) = event {
                custom.push(e);
            }
        })
        .await
        .unwrap();

    assert_eq!(
        custom,
        vec![
            PatternEvent::TreeExpanded {
                parent: 0,
                children: vec![1, 2]
            },
            PatternEvent::TreeEvaluated { node: 1, score: 0.3 },
            PatternEvent::TreeEvaluated { node: 2, score: 0.7 },
        ]
    );
}
