//! Progress events and notifiers.
//!
//! The client reports every state change it applies so a caller can render
//! live progress without polling the graph.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::client::RunOutcome;

/// Events emitted while a run streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The request was accepted and the stream is open.
  RunStarted {
    execution_id: String,
    /// `None` for a full run.
    node_ids: Option<Vec<String>>,
  },

  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  NodeCompleted {
    execution_id: String,
    node_id: String,
    result: serde_json::Value,
    cached: bool,
  },

  NodeFailed {
    execution_id: String,
    node_id: String,
    result: serde_json::Value,
  },

  RunFinished {
    execution_id: String,
    outcome: RunOutcome,
  },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Sends never block the stream read loop. Volume is a handful of events
/// per node.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// A notifier plus the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
