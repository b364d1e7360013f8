//! Streaming types for weft runs.
//!
//! `CompiledStateGraph::stream` and the pattern runners' `stream` methods return a
//! `ReceiverStream<StreamEvent<S>>`. The executor emits step lifecycle events;
//! pattern steps emit [`PatternEvent`]s through
//! [`RunContext::emit_custom`](crate::graph::RunContext::emit_custom).

use serde::Serialize;

use crate::graph::GraphError;

/// One event observed during a graph run.
#[derive(Debug, Clone)]
pub enum StreamEvent<S> {
    /// A step is about to run. `step` counts executor iterations from 1.
    TaskStart { node_id: String, step: usize },
    /// A step finished; `Err` carries the message written into `state.error`.
    TaskEnd {
        node_id: String,
        result: Result<(), String>,
    },
    /// State after the step's update was merged.
    Updates { node_id: String, state: S },
    /// Pattern-specific progress.
    Custom(PatternEvent),
    /// Last event of a spawned stream: `Err` when the executor stopped the
    /// run at the step ceiling or on cancellation.
    Done { outcome: Result<(), GraphError> },
}

/// Progress events emitted by the reasoning patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternEvent {
    TreeExpanded {
        parent: usize,
        children: Vec<usize>,
    },
    TreeEvaluated {
        node: usize,
        score: f64,
    },
    DagPlanned {
        node_ids: Vec<String>,
    },
    DagTick {
        tick: usize,
        executed: Vec<String>,
    },
    PlaceholderResolved {
        placeholder: String,
    },
    TrialVerdict {
        trial: usize,
        success: bool,
    },
}
