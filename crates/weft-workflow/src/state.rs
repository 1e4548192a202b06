//! Per-node lifecycle.
//!
//! ```text
//! idle ──▶ running ──▶ completed | failed
//!  ▲                          │
//!  └────────── reset ─────────┘
//! ```
//!
//! Any state may be reset to idle. Terminal states may replace each other
//! (the later event wins), and may be entered straight from idle for
//! results served from the backend cache. Nothing re-enters `running`
//! from a terminal state without a reset in between.

use serde_json::Value;
use weft_config::{NodeData, NodeStatus};

use crate::error::TransitionError;

/// A requested status change for one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
  /// Back to idle, clearing any previous result.
  Reset,
  Start,
  Complete(Value),
  Fail(Value),
}

impl Transition {
  pub fn target(&self) -> NodeStatus {
    match self {
      Transition::Reset => NodeStatus::Idle,
      Transition::Start => NodeStatus::Running,
      Transition::Complete(_) => NodeStatus::Completed,
      Transition::Fail(_) => NodeStatus::Failed,
    }
  }
}

/// Whether `from -> to` is a legal move.
pub fn is_allowed(from: NodeStatus, to: NodeStatus) -> bool {
  match to {
    NodeStatus::Idle => true,
    NodeStatus::Running => matches!(from, NodeStatus::Idle | NodeStatus::Running),
    NodeStatus::Completed | NodeStatus::Failed => true,
  }
}

/// Apply a transition to a node's data in place.
///
/// On success returns the new status. On rejection the data is untouched.
pub fn apply(
  node_id: &str,
  data: &mut NodeData,
  transition: Transition,
) -> Result<NodeStatus, TransitionError> {
  let from = data.status();
  let to = transition.target();
  if !is_allowed(from, to) {
    return Err(TransitionError {
      node_id: node_id.to_string(),
      from,
      to,
    });
  }

  match transition {
    Transition::Reset => {
      data.execution_result = None;
    }
    Transition::Start => {}
    Transition::Complete(result) | Transition::Fail(result) => {
      data.execution_result = match result {
        Value::Null => None,
        other => Some(other),
      };
    }
  }
  data.status = Some(to);
  Ok(to)
}
