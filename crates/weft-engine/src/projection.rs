//! Applying wire events to the graph.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use weft_config::NodeStatus;
use weft_workflow::{GraphModel, Transition, WorkflowError};

use crate::events::ExecutionEvent;
use crate::wire::WireEvent;

/// What applying one event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Projected {
  /// A node changed state; the event to report.
  Node(ExecutionEvent),
  /// The event named an unknown node or an illegal move and was dropped.
  Ignored,
  /// `workflow_completed` or `execution_cancelled`.
  Terminal { cancelled: bool },
}

/// Per-run bookkeeping of the last terminal state seen for each node.
#[derive(Debug, Default)]
pub struct Projection {
  execution_id: String,
  finished: HashMap<String, NodeStatus>,
}

impl Projection {
  pub fn new(execution_id: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      finished: HashMap::new(),
    }
  }

  /// Apply one event to `model`, in arrival order.
  ///
  /// A later event for a node replaces the earlier one. Events the state
  /// machine rejects (e.g. `node_started` for an upstream node that already
  /// holds a completed result) are dropped; a later completion for that node
  /// still lands.
  pub fn apply(&mut self, model: &mut GraphModel, event: WireEvent) -> Projected {
    let execution_id = self.execution_id.clone();
    let (node_id, transition, report) = match event {
      WireEvent::WorkflowCompleted { .. } => return Projected::Terminal { cancelled: false },
      WireEvent::ExecutionCancelled { .. } => return Projected::Terminal { cancelled: true },
      WireEvent::NodeStarted { node_id } => {
        let report = ExecutionEvent::NodeStarted {
          execution_id,
          node_id: node_id.clone(),
        };
        (node_id, Transition::Start, report)
      }
      WireEvent::NodeCompleted { node_id, result } => {
        let report = ExecutionEvent::NodeCompleted {
          execution_id,
          node_id: node_id.clone(),
          result: result.clone(),
          cached: false,
        };
        (node_id, Transition::Complete(result), report)
      }
      WireEvent::NodeCompletedCache { node_id, result } => {
        info!(
          execution_id = %self.execution_id,
          node_id = %node_id,
          "node_completed_from_cache"
        );
        let report = ExecutionEvent::NodeCompleted {
          execution_id,
          node_id: node_id.clone(),
          result: result.clone(),
          cached: true,
        };
        (node_id, Transition::Complete(result), report)
      }
      WireEvent::NodeFailed { node_id, result } => {
        let report = ExecutionEvent::NodeFailed {
          execution_id,
          node_id: node_id.clone(),
          result: result.clone(),
        };
        (node_id, Transition::Fail(result), report)
      }
    };

    match model.transition(&node_id, transition) {
      Ok(status) => {
        match status {
          NodeStatus::Running => {
            info!(execution_id = %self.execution_id, node_id = %node_id, "node_started");
          }
          NodeStatus::Completed => {
            info!(execution_id = %self.execution_id, node_id = %node_id, "node_completed");
          }
          NodeStatus::Failed => {
            warn!(execution_id = %self.execution_id, node_id = %node_id, "node_failed");
          }
          NodeStatus::Idle => {}
        }
        if status.is_terminal() {
          self.finished.insert(node_id, status);
        }
        Projected::Node(report)
      }
      Err(WorkflowError::NodeNotFound(_)) => {
        debug!(
          execution_id = %self.execution_id,
          node_id = %node_id,
          "event_for_unknown_node"
        );
        Projected::Ignored
      }
      Err(e) => {
        debug!(
          execution_id = %self.execution_id,
          node_id = %node_id,
          error = %e,
          "event_transition_rejected"
        );
        Projected::Ignored
      }
    }
  }

  /// Nodes whose latest terminal state is completed.
  pub fn completed(&self) -> usize {
    self.count(NodeStatus::Completed)
  }

  /// Nodes whose latest terminal state is failed.
  pub fn failed(&self) -> usize {
    self.count(NodeStatus::Failed)
  }

  fn count(&self, status: NodeStatus) -> usize {
    self.finished.values().filter(|s| **s == status).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};
  use weft_config::{Edge, Node, NodeKind};
  use weft_workflow::RunScope;

  fn model() -> GraphModel {
    let mut model = GraphModel::new("w", "Chain");
    model.add_node(Node::new("A", NodeKind::GeminiText)).unwrap();
    model.add_node(Node::new("B", NodeKind::SpeechGen)).unwrap();
    model.add_node(Node::new("C", NodeKind::Output)).unwrap();
    model.connect(Edge::new("e1", "A", "B"));
    model.connect(Edge::new("e2", "B", "C"));
    model
  }

  fn started(id: &str) -> WireEvent {
    WireEvent::NodeStarted {
      node_id: id.to_string(),
    }
  }

  fn completed(id: &str, result: Value) -> WireEvent {
    WireEvent::NodeCompleted {
      node_id: id.to_string(),
      result,
    }
  }

  fn failed(id: &str, result: Value) -> WireEvent {
    WireEvent::NodeFailed {
      node_id: id.to_string(),
      result,
    }
  }

  #[test]
  fn test_completion_after_failure_wins() {
    let mut model = model();
    let mut projection = Projection::new("x");
    projection.apply(&mut model, started("B"));
    projection.apply(&mut model, failed("B", json!({ "error": "quota" })));
    projection.apply(&mut model, completed("B", json!({ "audio": "gs://a.wav" })));

    let node = model.node("B").unwrap();
    assert_eq!(node.status(), NodeStatus::Completed);
    assert_eq!(node.data.execution_result, Some(json!({ "audio": "gs://a.wav" })));
    assert_eq!(projection.completed(), 1);
    assert_eq!(projection.failed(), 0);
  }

  #[test]
  fn test_cached_completion_reports_cached() {
    let mut model = model();
    let mut projection = Projection::new("x");
    let projected = projection.apply(
      &mut model,
      WireEvent::NodeCompletedCache {
        node_id: "A".to_string(),
        result: json!({ "text": "cached" }),
      },
    );
    assert!(matches!(
      projected,
      Projected::Node(ExecutionEvent::NodeCompleted { cached: true, .. })
    ));
    assert_eq!(model.node("A").unwrap().status(), NodeStatus::Completed);
  }

  #[test]
  fn test_unknown_node_is_ignored() {
    let mut model = model();
    let before = model.clone();
    let mut projection = Projection::new("x");
    assert_eq!(projection.apply(&mut model, started("ghost")), Projected::Ignored);
    assert_eq!(model, before);
  }

  #[test]
  fn test_upstream_restart_is_dropped_but_result_lands() {
    let mut model = model();
    model
      .transition("A", Transition::Complete(json!({ "text": "old" })))
      .unwrap();
    model.reset_for_run(&RunScope::Nodes(["B".to_string(), "C".to_string()].into()));

    let mut projection = Projection::new("x");
    assert_eq!(projection.apply(&mut model, started("A")), Projected::Ignored);
    assert_eq!(model.node("A").unwrap().data.execution_result, Some(json!({ "text": "old" })));

    projection.apply(&mut model, completed("A", json!({ "text": "new" })));
    assert_eq!(model.node("A").unwrap().data.execution_result, Some(json!({ "text": "new" })));
  }

  #[test]
  fn test_terminal_events() {
    let mut model = model();
    let mut projection = Projection::new("x");
    assert_eq!(
      projection.apply(&mut model, WireEvent::WorkflowCompleted { execution_id: None }),
      Projected::Terminal { cancelled: false }
    );
    assert_eq!(
      projection.apply(
        &mut model,
        WireEvent::ExecutionCancelled {
          execution_id: Some("x".to_string())
        }
      ),
      Projected::Terminal { cancelled: true }
    );
  }

  #[test]
  fn test_every_sequence_ends_in_a_known_state() {
    let events = [
      started("A"),
      completed("A", json!(1)),
      started("A"),
      failed("A", json!(2)),
      started("B"),
      started("B"),
      completed("C", Value::Null),
      failed("B", json!(3)),
      completed("B", json!(4)),
    ];
    let mut model = model();
    let mut projection = Projection::new("x");
    for event in events {
      projection.apply(&mut model, event);
    }
    assert_eq!(model.node("A").unwrap().status(), NodeStatus::Failed);
    assert_eq!(model.node("B").unwrap().status(), NodeStatus::Completed);
    assert_eq!(model.node("C").unwrap().status(), NodeStatus::Completed);
    assert_eq!(model.node("C").unwrap().data.execution_result, None);
    assert_eq!(projection.completed(), 2);
    assert_eq!(projection.failed(), 1);
  }
}
