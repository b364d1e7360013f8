//! Integration tests: placeholder planning, dependency-ordered solving and filling.

mod common;
mod init_logging;

use std::sync::Arc;

use serde_json::json;
use weft::parse::{PlaceholderPlan, SolverRequest};
use weft::{
    FnTool, MockReasoner, PatternDeps, PatternEvent, PlaceholderRunner, RunError, StreamEvent,
    ToolRegistry,
};

use common::args;

fn lookup_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(FnTool::new("lookup", "Look up a fact", |a| {
            let q = a.get("q").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(match q {
                "CEO of Acme" => "Jane Doe".to_string(),
                "largest retailer" => "Acme".to_string(),
                other => format!("unknown: {}", other),
            })
        }))
        .unwrap();
    registry
}

fn runner(thinking: Arc<MockReasoner>) -> PlaceholderRunner {
    let deps = PatternDeps::new(common::reasoners(thinking, None)).with_tools(lookup_tools());
    PlaceholderRunner::new(&deps).unwrap()
}

/// **Scenario**: "CEO is {ceo}" with ceo looked up as "Jane Doe" fills to "CEO is Jane Doe".
#[tokio::test]
async fn solved_placeholder_fills_template() {
    let plan = PlaceholderPlan {
        template: "CEO is {ceo}".into(),
        requests: vec![SolverRequest::new("ceo", "lookup", args(json!({"q": "CEO of Acme"})))],
    };
    let thinking = Arc::new(MockReasoner::always("The CEO is Jane Doe."));
    let state = runner(thinking.clone()).invoke_plan("who runs Acme?", plan).await.unwrap();

    assert_eq!(state.filled.as_deref(), Some("CEO is Jane Doe"));
    assert_eq!(state.template.as_str(), "CEO is {ceo}");
    assert_eq!(state.answer.as_deref(), Some("The CEO is Jane Doe."));
    let (_, user) = thinking.calls().pop().unwrap();
    assert!(user.contains("CEO is Jane Doe"), "{}", user);
    assert!(user.contains("ceo = Jane Doe"), "{}", user);
}

/// **Scenario**: A request declared before the placeholder it references is
/// solved after it, with the value substituted into its parameters.
#[tokio::test]
async fn later_declared_dependency_is_solved_first() {
    let plan = PlaceholderPlan {
        template: "{company} is run by {ceo}".into(),
        requests: vec![
            SolverRequest::new("ceo", "lookup", args(json!({"q": "CEO of {company}"}))),
            SolverRequest::new("company", "lookup", args(json!({"q": "largest retailer"}))),
        ],
    };
    let state = runner(Arc::new(MockReasoner::always("ok")))
        .invoke_plan("t", plan)
        .await
        .unwrap();

    assert_eq!(
        state.resolution_order.values(),
        &["company".to_string(), "ceo".to_string()]
    );
    assert_eq!(state.filled.as_deref(), Some("Acme is run by Jane Doe"));
}

/// **Scenario**: A request for an unregistered tool is answered by the solver reasoner.
#[tokio::test]
async fn unknown_tool_falls_back_to_solver() {
    let thinking = Arc::new(MockReasoner::from_fn(|system, user| {
        Ok(if system.contains("stand in for the tool") {
            assert!(user.contains("Tool: population"), "{}", user);
            "8 million".to_string()
        } else {
            "done".to_string()
        })
    }));
    let plan = PlaceholderPlan {
        template: "Population: {pop}".into(),
        requests: vec![SolverRequest::new("pop", "population", args(json!({"city": "NYC"})))],
    };
    let state = runner(thinking).invoke_plan("t", plan).await.unwrap();
    assert_eq!(state.filled.as_deref(), Some("Population: 8 million"));
}

/// **Scenario**: A template placeholder with no request ends in an error report
/// carrying the partial fill.
#[tokio::test]
async fn missing_request_is_reported_with_partial_fill() {
    let plan = PlaceholderPlan {
        template: "{company} was founded in {year}".into(),
        requests: vec![SolverRequest::new("company", "lookup", args(json!({"q": "largest retailer"})))],
    };
    let thinking = Arc::new(MockReasoner::always("unused"));
    let state = runner(thinking.clone()).invoke_plan("t", plan).await.unwrap();

    assert_eq!(state.error.as_deref(), Some("unresolved placeholders: year"));
    let answer = state.answer.as_deref().unwrap_or_default();
    assert!(answer.starts_with("Error: unresolved placeholders: year"), "{}", answer);
    assert!(answer.contains("Acme was founded in {year}"), "{}", answer);
    assert!(answer.contains("year = (unresolved)"), "{}", answer);
    assert_eq!(thinking.call_count(), 0);
}

/// **Scenario**: The planner's reply is parsed; every solved placeholder is streamed.
#[tokio::test]
async fn planned_run_streams_resolutions() {
    let reply = "PLAN: {company} is led by {ceo}.\n\n\
                 SOLVER: ceo\nTOOL: lookup\nPARAMS: {\"q\": \"CEO of {company}\"}\n\n\
                 SOLVER: company\nTOOL: lookup\nPARAMS: {\"q\": \"largest retailer\"}";
    let thinking = Arc::new(MockReasoner::from_fn(move |system, _| {
        Ok(if system.contains("plan an answer") {
            reply.to_string()
        } else {
            "Acme is led by Jane Doe.".to_string()
        })
    }));

    let mut resolved = Vec::new();
    let state = runner(thinking)
        .stream_with_callback("who leads the largest retailer?", |event| {
            if let StreamEvent::Custom(PatternEvent::PlaceholderResolved { placeholder }) = event {
                resolved.push(placeholder);
            }
        })
        .await
        .unwrap();

    assert_eq!(resolved, vec!["company".to_string(), "ceo".to_string()]);
    assert_eq!(state.answer.as_deref(), Some("Acme is led by Jane Doe."));
}

#[tokio::test]
async fn pattern_run_fails_with_partial_on_unresolved_plan() {
    use weft::Pattern;

    let thinking = Arc::new(MockReasoner::from_fn(|system, _| {
        Ok(if system.contains("plan an answer") {
            "PLAN: answer is {x}".to_string()
        } else {
            "unused".to_string()
        })
    }));
    match runner(thinking).run("t").await {
        Err(RunError::Failed { message, partial }) => {
            assert!(message.contains("x"), "{}", message);
            assert!(partial.contains("answer is {x}"), "{}", partial);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}
