use serde::{Deserialize, Serialize};

/// A directed connection from one node's output port to another's input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub id: String,
  pub source: String,
  pub target: String,
  /// Named output port on the source node.
  #[serde(
    rename = "sourceHandle",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub source_handle: Option<String>,
  /// Named input port on the target node.
  #[serde(
    rename = "targetHandle",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub target_handle: Option<String>,
}

impl Edge {
  /// Edge with no explicit handles; the backend falls back to default ports.
  pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
      source_handle: None,
      target_handle: None,
    }
  }

  pub fn with_handles(
    mut self,
    source_handle: impl Into<String>,
    target_handle: impl Into<String>,
  ) -> Self {
    self.source_handle = Some(source_handle.into());
    self.target_handle = Some(target_handle.into());
    self
  }

  /// Whether this edge touches the given node on either end.
  pub fn touches(&self, node_id: &str) -> bool {
    self.source == node_id || self.target == node_id
  }
}
