use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a node as observed through an execution stream.
///
/// An absent status in a document is read as [`NodeStatus::Idle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
  #[default]
  Idle,
  Running,
  Completed,
  Failed,
}

impl NodeStatus {
  /// `Completed` or `Failed`.
  pub fn is_terminal(self) -> bool {
    matches!(self, NodeStatus::Completed | NodeStatus::Failed)
  }
}

impl fmt::Display for NodeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NodeStatus::Idle => write!(f, "idle"),
      NodeStatus::Running => write!(f, "running"),
      NodeStatus::Completed => write!(f, "completed"),
      NodeStatus::Failed => write!(f, "failed"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wire_names() {
    assert_eq!(serde_json::to_string(&NodeStatus::Completed).unwrap(), "\"completed\"");
    let status: NodeStatus = serde_json::from_str("\"failed\"").unwrap();
    assert_eq!(status, NodeStatus::Failed);
  }

  #[test]
  fn test_terminal_states() {
    assert!(!NodeStatus::Idle.is_terminal());
    assert!(!NodeStatus::Running.is_terminal());
    assert!(NodeStatus::Completed.is_terminal());
    assert!(NodeStatus::Failed.is_terminal());
  }
}
