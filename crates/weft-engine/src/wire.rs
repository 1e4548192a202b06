use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event as the backend writes it on the execution stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
  NodeStarted {
    node_id: String,
  },
  NodeCompleted {
    node_id: String,
    #[serde(default)]
    result: Value,
  },
  /// Completion served from the backend cache.
  NodeCompletedCache {
    node_id: String,
    #[serde(default)]
    result: Value,
  },
  NodeFailed {
    node_id: String,
    #[serde(default)]
    result: Value,
  },
  WorkflowCompleted {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_id: Option<String>,
  },
  ExecutionCancelled {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_id: Option<String>,
  },
}

impl WireEvent {
  pub fn node_id(&self) -> Option<&str> {
    match self {
      WireEvent::NodeStarted { node_id }
      | WireEvent::NodeCompleted { node_id, .. }
      | WireEvent::NodeCompletedCache { node_id, .. }
      | WireEvent::NodeFailed { node_id, .. } => Some(node_id),
      WireEvent::WorkflowCompleted { .. } | WireEvent::ExecutionCancelled { .. } => None,
    }
  }

  /// Whether nothing more is expected after this event.
  pub fn is_terminal(&self) -> bool {
    self.node_id().is_none()
  }
}
