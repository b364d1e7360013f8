//! Run context passed into nodes: cancellation token and optional event sender.
//!
//! Built by `CompiledStateGraph::invoke` (empty context) or by callers of
//! `invoke_with_context` / `stream`. Cloning is cheap; all clones share the same
//! token and channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::stream::{PatternEvent, StreamEvent};

pub struct RunContext<S> {
    /// Cancelled by the caller to stop the run. Checked by the executor between
    /// steps and raced against every reasoner and tool call.
    pub cancel: CancellationToken,
    /// When set, the executor and nodes send events here.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
}

impl<S> Clone for RunContext<S> {
    fn clone(&self) -> Self {
        Self {
            cancel: self.cancel.clone(),
            stream_tx: self.stream_tx.clone(),
        }
    }
}

impl<S> Default for RunContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RunContext<S> {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            stream_tx: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_stream(mut self, tx: mpsc::Sender<StreamEvent<S>>) -> Self {
        self.stream_tx = Some(tx);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sends an event when a stream is attached. A dropped receiver is ignored.
    pub async fn emit(&self, event: StreamEvent<S>) {
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }

    pub async fn emit_custom(&self, event: PatternEvent) {
        self.emit(StreamEvent::Custom(event)).await;
    }
}
