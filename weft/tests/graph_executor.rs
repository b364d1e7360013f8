//! Integration tests: the cyclic executor through the public API with a
//! hand-written state record.

mod init_logging;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_stream::StreamExt;
use weft::graph::{InnerRun, NodeMiddleware};
use weft::{
    AgentError, Channel, FnNode, GraphError, LastValue, RetryPolicy, RunContext, StateGraph,
    StateRecord, StreamEvent, Topic, END, START,
};

#[derive(Debug, Clone, Default)]
struct Tally {
    count: LastValue<i64>,
    log: Topic<String>,
    error: LastValue<Option<String>>,
}

#[derive(Debug, Default)]
struct TallyUpdate {
    count: Option<i64>,
    log: Vec<String>,
}

impl StateRecord for Tally {
    type Update = TallyUpdate;

    fn merge(&mut self, update: TallyUpdate) {
        self.count.apply(update.count);
        self.log.apply(update.log);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: String) {
        self.error.apply(Some(Some(message)));
    }
}

fn bump(id: &'static str) -> Arc<FnNode<Tally>> {
    Arc::new(FnNode::new(id, move |s: &Tally| {
        Ok(TallyUpdate {
            count: Some(*s.count + 1),
            log: vec![id.to_string()],
        })
    }))
}

/// work ↔ check until count reaches `until`.
fn loop_graph(until: i64) -> StateGraph<Tally> {
    let mut graph = StateGraph::<Tally>::new();
    let path_map: HashMap<String, String> = [
        ("again".to_string(), "work".to_string()),
        ("stop".to_string(), END.to_string()),
    ]
    .into_iter()
    .collect();
    graph
        .add_node("work", bump("work"))
        .add_node("check", bump("check"))
        .add_edge(START, "work")
        .add_edge("work", "check")
        .add_conditional_edges(
            "check",
            Arc::new(move |s: &Tally| {
                if *s.count >= until { "stop".into() } else { "again".into() }
            }),
            Some(path_map),
        );
    graph
}

#[tokio::test]
async fn stream_yields_lifecycle_events_in_step_order() {
    let compiled = loop_graph(4).compile().unwrap();
    let events: Vec<StreamEvent<Tally>> = compiled.stream(Tally::default(), RunContext::new()).collect().await;

    let starts: Vec<(String, usize)> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::TaskStart { node_id, step } => Some((node_id.clone(), *step)),
            _ => None,
        })
        .collect();
    assert_eq!(
        starts,
        vec![
            ("work".to_string(), 1),
            ("check".to_string(), 2),
            ("work".to_string(), 3),
            ("check".to_string(), 4),
        ]
    );
    assert!(matches!(events.last(), Some(StreamEvent::Done { outcome: Ok(()) })));
    match events.iter().rev().nth(1) {
        Some(StreamEvent::Updates { node_id, state }) => {
            assert_eq!(node_id, "check");
            assert_eq!(*state.count, 4);
        }
        other => panic!("unexpected event before Done: {:?}", other),
    }
}

/// **Scenario**: A streamed run stopped by the ceiling ends with a failed `Done`.
#[tokio::test]
async fn stream_reports_ceiling_stop_in_done_event() {
    let compiled = loop_graph(i64::MAX).with_max_steps(3).compile().unwrap();
    let events: Vec<StreamEvent<Tally>> = compiled.stream(Tally::default(), RunContext::new()).collect().await;

    match events.last() {
        Some(StreamEvent::Done { outcome: Err(err) }) => assert_eq!(
            err,
            &GraphError::BudgetExhausted {
                max_steps: 3,
                last_node: "check".into()
            }
        ),
        other => panic!("expected failed Done, got {:?}", other),
    }
}

/// **Scenario**: Hitting the step ceiling returns BudgetExhausted and leaves
/// the merged progress in the state.
#[tokio::test]
async fn step_ceiling_keeps_partial_state() {
    let compiled = loop_graph(i64::MAX).with_max_steps(5).compile().unwrap();
    let mut state = Tally::default();
    let err = compiled.run(&mut state, &RunContext::new()).await.unwrap_err();

    assert_eq!(
        err,
        GraphError::BudgetExhausted {
            max_steps: 5,
            last_node: "check".into()
        }
    );
    assert_eq!(*state.count, 5);
    assert_eq!(state.log.len(), 5);
}

struct Recorder(Mutex<Vec<String>>);

#[async_trait]
impl NodeMiddleware<Tally> for Recorder {
    async fn around_run(
        &self,
        node_id: &str,
        state: Tally,
        inner: InnerRun<Tally>,
    ) -> Result<TallyUpdate, AgentError> {
        if let Ok(mut seen) = self.0.lock() {
            seen.push(format!("{}@{}", node_id, *state.count));
        }
        inner(state).await
    }
}

#[tokio::test]
async fn middleware_sees_every_step_with_its_input_state() {
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let compiled = loop_graph(2)
        .with_middleware(recorder.clone())
        .compile()
        .unwrap();
    compiled.invoke(Tally::default()).await.unwrap();
    assert_eq!(*recorder.0.lock().unwrap(), vec!["work@0", "check@1"]);
}

/// **Scenario**: A transient step failure is retried under the graph's retry policy.
#[tokio::test]
async fn transient_failure_succeeds_on_retry() {
    let attempts = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&attempts);
    let mut graph = StateGraph::<Tally>::new()
        .with_retry_policy(RetryPolicy::fixed(2, Duration::from_millis(1)));
    graph
        .add_node(
            "flaky",
            Arc::new(FnNode::new("flaky", move |_s: &Tally| {
                let mut n = counter.lock().map_err(|_| AgentError::ExecutionFailed("poisoned".into()))?;
                *n += 1;
                if *n == 1 {
                    Err(AgentError::Reasoner("rate limited".into()))
                } else {
                    Ok(TallyUpdate {
                        count: Some(7),
                        log: vec![],
                    })
                }
            })),
        )
        .add_edge(START, "flaky")
        .add_edge("flaky", END);

    let state = graph.compile().unwrap().invoke(Tally::default()).await.unwrap();
    assert_eq!(*state.count, 7);
    assert!(state.error.is_none());
    assert_eq!(*attempts.lock().unwrap(), 2);
}
