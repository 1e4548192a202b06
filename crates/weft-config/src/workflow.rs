use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::kind::NodeKind;
use crate::node::Node;

pub const UNTITLED: &str = "Untitled Workflow";

fn untitled() -> String {
  UNTITLED.to_string()
}

/// A complete workflow as sent to the backend and stored in its catalog.
///
/// Node order carries no meaning; it only keeps iteration stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub id: String,
  #[serde(default = "untitled")]
  pub name: String,
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

/// The export/import document: just the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl WorkflowDef {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      nodes: Vec::new(),
      edges: Vec::new(),
    }
  }

  /// The three-node starter graph an empty canvas opens with.
  pub fn sample() -> Self {
    let nodes = vec![
      Node::new("1", NodeKind::GeminiText)
        .with_label("Start Idea")
        .with_value("Explain quantum computing in 5 words")
        .with_position(100.0, 100.0),
      Node::new("2", NodeKind::SpeechGen)
        .with_label("Narrate")
        .with_position(500.0, 100.0),
      {
        let mut out = Node::new("3", NodeKind::Output)
          .with_label("Audio Output")
          .with_position(900.0, 100.0);
        out
          .data
          .extra
          .insert("outputType".to_string(), "audio".into());
        out
      },
    ];
    let edges = vec![Edge::new("e1-2", "1", "2"), Edge::new("e2-3", "2", "3")];

    Self {
      id: format!("workflow-{}", uuid::Uuid::new_v4()),
      name: untitled(),
      nodes,
      edges,
    }
  }
}

impl From<WorkflowDef> for GraphDocument {
  fn from(workflow: WorkflowDef) -> Self {
    Self {
      nodes: workflow.nodes,
      edges: workflow.edges,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node::Position;

  #[test]
  fn test_name_defaults_to_untitled() {
    let workflow: WorkflowDef =
      serde_json::from_str(r#"{"id":"w1","nodes":[],"edges":[]}"#).unwrap();
    assert_eq!(workflow.name, UNTITLED);
  }

  #[test]
  fn test_sample_is_a_chain() {
    let sample = WorkflowDef::sample();
    assert_eq!(sample.nodes.len(), 3);
    assert_eq!(sample.edges.len(), 2);
    assert_eq!(sample.nodes[1].kind, NodeKind::SpeechGen);
    assert_eq!(sample.edges[1].source, "2");
    assert_eq!(sample.edges[1].target, "3");
    assert_eq!(sample.nodes[2].position, Position::new(900.0, 100.0));
  }
}
