use serde_json::{Map, Value};
use weft_config::{Edge, Node};

use crate::error::WorkflowError;
use crate::model::GraphModel;
use crate::plan::RunScope;

/// An edit requested by the editor surface.
///
/// Nodes never mutate the graph themselves; they emit an intent and the
/// model applies it.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIntent {
  NodeAdded(Node),
  NodeUpdated {
    node_id: String,
    patch: Map<String, Value>,
  },
  NodeDeleteRequested {
    node_id: String,
  },
  /// Re-run this node and everything downstream of it.
  PartialRunRequested {
    node_id: String,
  },
  EdgeConnected(Edge),
  EdgeDisconnected {
    edge_id: String,
  },
}

impl GraphModel {
  /// Apply an intent.
  ///
  /// Returns the run scope for [`GraphIntent::PartialRunRequested`], `None`
  /// for pure edits. Planning a run does not touch node state; resetting the
  /// scope is the executor's job.
  pub fn dispatch(&mut self, intent: GraphIntent) -> Result<Option<RunScope>, WorkflowError> {
    match intent {
      GraphIntent::NodeAdded(node) => self.add_node(node)?,
      GraphIntent::NodeUpdated { node_id, patch } => self.update_node_data(&node_id, patch)?,
      GraphIntent::NodeDeleteRequested { node_id } => {
        self.remove_node(&node_id)?;
      }
      GraphIntent::PartialRunRequested { node_id } => {
        if self.node(&node_id).is_none() {
          return Err(WorkflowError::NodeNotFound(node_id));
        }
        return Ok(Some(self.plan_partial_run(&node_id)));
      }
      GraphIntent::EdgeConnected(edge) => self.connect(edge),
      GraphIntent::EdgeDisconnected { edge_id } => {
        self.disconnect(&edge_id);
      }
    }
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use weft_config::{NodeKind, NodeStatus};

  fn chain() -> GraphModel {
    let mut model = GraphModel::new("w", "Chain");
    for (id, kind) in [
      ("A", NodeKind::GeminiText),
      ("B", NodeKind::SpeechGen),
      ("C", NodeKind::Output),
    ] {
      model.dispatch(GraphIntent::NodeAdded(Node::new(id, kind))).unwrap();
    }
    model
      .dispatch(GraphIntent::EdgeConnected(Edge::new("e1", "A", "B")))
      .unwrap();
    model
      .dispatch(GraphIntent::EdgeConnected(Edge::new("e2", "B", "C")))
      .unwrap();
    model
  }

  #[test]
  fn test_partial_run_returns_scope() {
    let mut model = chain();
    let scope = model
      .dispatch(GraphIntent::PartialRunRequested {
        node_id: "B".to_string(),
      })
      .unwrap();
    assert_eq!(
      scope,
      Some(RunScope::Nodes(["B".to_string(), "C".to_string()].into()))
    );
    assert!(model.nodes().iter().all(|n| n.status() == NodeStatus::Idle));
  }

  #[test]
  fn test_partial_run_unknown_node() {
    let mut model = chain();
    let result = model.dispatch(GraphIntent::PartialRunRequested {
      node_id: "Z".to_string(),
    });
    assert!(matches!(result, Err(WorkflowError::NodeNotFound(_))));
  }

  #[test]
  fn test_delete_intent_removes_edges() {
    let mut model = chain();
    model
      .dispatch(GraphIntent::NodeDeleteRequested {
        node_id: "A".to_string(),
      })
      .unwrap();
    assert_eq!(model.edges().len(), 1);
    assert_eq!(model.edges()[0].id, "e2");
  }

  #[test]
  fn test_update_intent() {
    let mut model = chain();
    let Value::Object(patch) = json!({ "value": "Explain rust in 5 words" }) else {
      unreachable!()
    };
    let result = model
      .dispatch(GraphIntent::NodeUpdated {
        node_id: "A".to_string(),
        patch,
      })
      .unwrap();
    assert_eq!(result, None);
    assert_eq!(
      model.node("A").unwrap().data.value,
      Some(json!("Explain rust in 5 words"))
    );
  }

  #[test]
  fn test_disconnect_unknown_edge_is_noop() {
    let mut model = chain();
    model
      .dispatch(GraphIntent::EdgeDisconnected {
        edge_id: "nope".to_string(),
      })
      .unwrap();
    assert_eq!(model.edges().len(), 2);
  }
}
