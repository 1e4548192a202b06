use thiserror::Error;

use weft_config::NodeStatus;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("node already exists: {0}")]
  DuplicateNode(String),

  #[error("invalid data patch for node '{node_id}'")]
  InvalidPatch {
    node_id: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("node '{node_id}': '{field}' is owned by execution and cannot be patched")]
  RunStateField { node_id: String, field: String },

  #[error(transparent)]
  Transition(#[from] TransitionError),
}

/// A status change the node state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node '{node_id}' cannot move from {from} to {to}")]
pub struct TransitionError {
  pub node_id: String,
  pub from: NodeStatus,
  pub to: NodeStatus,
}

/// Errors produced while reading a portable graph document.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("document is not a JSON object")]
  NotAnObject,

  #[error("document has no '{0}' collection")]
  MissingCollection(&'static str),

  #[error("invalid workflow document: {0}")]
  Json(#[from] serde_json::Error),
}
