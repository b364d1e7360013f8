//! Integration tests: trial loop with judged attempts and carried lessons.

mod common;
mod init_logging;

use std::sync::Arc;

use weft::config::WeftConfig;
use weft::parse::Verdict;
use weft::{MockReasoner, PatternDeps, PatternEvent, ReflexionRunner, StreamEvent};

fn runner(thinking: Arc<MockReasoner>, judge: Arc<MockReasoner>, max_trials: usize) -> ReflexionRunner {
    let mut config = WeftConfig::default();
    config.trials.max_trials = max_trials;
    let deps = PatternDeps::new(common::reasoners(thinking, Some(judge))).with_config(config);
    ReflexionRunner::new(&deps).unwrap()
}

/// Thinking mock: numbered attempts, and a lesson per reflection.
fn actor() -> Arc<MockReasoner> {
    Arc::new(MockReasoner::scripted([
        "attempt one",
        "check the units",
        "attempt two",
        "round at the end",
        "attempt three",
    ]))
}

/// **Scenario**: Success on the first trial finishes without reflecting.
#[tokio::test]
async fn first_success_finishes() {
    let thinking = actor();
    let judge = Arc::new(MockReasoner::always("Looks right.\nSUCCESS"));
    let state = runner(thinking.clone(), judge, 3).invoke("t").await.unwrap();

    assert_eq!(*state.trial, 1);
    assert!(state.reflections.is_empty());
    assert_eq!(*state.verdict, Some(Verdict::Success));
    assert_eq!(state.answer.as_deref(), Some("attempt one"));
    assert_eq!(thinking.call_count(), 1);
}

/// **Scenario**: Each failed trial adds a lesson that the next attempt sees.
#[tokio::test]
async fn lessons_carry_into_later_attempts() {
    let thinking = actor();
    let judge = Arc::new(MockReasoner::scripted(["FAILURE", "FAILURE", "SUCCESS"]));
    let state = runner(thinking.clone(), judge, 5).invoke("t").await.unwrap();

    assert_eq!(*state.trial, 3);
    assert_eq!(
        state.reflections.values(),
        &["check the units".to_string(), "round at the end".to_string()]
    );
    assert_eq!(state.answer.as_deref(), Some("attempt three"));

    let calls = thinking.calls();
    let (_, third_attempt) = &calls[4];
    assert!(third_attempt.contains("1. check the units"), "{}", third_attempt);
    assert!(third_attempt.contains("2. round at the end"), "{}", third_attempt);
    let (_, first_attempt) = &calls[0];
    assert!(first_attempt.contains("(none)"), "{}", first_attempt);
}

/// **Scenario**: With every trial failing, the loop stops at max_trials and
/// answers with the last attempt.
#[tokio::test]
async fn exhausted_trials_answer_with_last_attempt() {
    let judge = Arc::new(MockReasoner::always("no verdict here"));
    let mut verdicts = Vec::new();
    let state = runner(actor(), judge.clone(), 2)
        .stream_with_callback("t", |event| {
            if let StreamEvent::Custom(PatternEvent::TrialVerdict { trial, success }) = event {
                verdicts.push((trial, success));
            }
        })
        .await
        .unwrap();

    assert_eq!(*state.trial, 2);
    assert_eq!(state.attempts.len(), 2);
    assert_eq!(state.answer.as_deref(), Some("attempt two"));
    assert!(state.error.is_none());
    assert_eq!(judge.call_count(), 2);
    assert_eq!(verdicts, vec![(1, false), (2, false)]);
}

/// **Scenario**: Forty failing trials outrun the default executor ceiling
/// but still finish with the last attempt.
#[tokio::test]
async fn many_trials_fit_under_the_raised_ceiling() {
    let thinking = Arc::new(MockReasoner::always("again"));
    let judge = Arc::new(MockReasoner::always("FAILURE"));
    let state = runner(thinking, judge.clone(), 40).invoke("t").await.unwrap();

    assert_eq!(*state.trial, 40);
    assert_eq!(state.answer.as_deref(), Some("again"));
    assert!(state.error.is_none());
    assert_eq!(judge.call_count(), 40);
}

#[tokio::test]
async fn failing_actor_reports_error() {
    let thinking = Arc::new(MockReasoner::failing("quota exceeded"));
    let judge = Arc::new(MockReasoner::always("SUCCESS"));
    let state = runner(thinking, judge.clone(), 3).invoke("t").await.unwrap();

    let answer = state.answer.as_deref().unwrap_or_default();
    assert!(answer.starts_with("Error: attempt:"), "{}", answer);
    assert!(answer.contains("quota exceeded"), "{}", answer);
    assert!(answer.ends_with("Last attempt:\n(no attempt)"), "{}", answer);
    assert_eq!(judge.call_count(), 0);
}
