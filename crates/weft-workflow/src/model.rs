use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;
use weft_config::{Edge, Node, NodeKind, NodeStatus, UNTITLED, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::plan::RunScope;
use crate::state::{self, Transition};

/// Node data keys only the executor writes, through [`GraphModel::transition`].
const RUN_STATE_FIELDS: &[&str] = &["status", "executionResult"];

/// The editable graph.
///
/// All node and edge mutation goes through these methods. Removing a node
/// always removes its edges, so the model never holds an edge pointing at a
/// node it does not have (imports excepted, see [`GraphModel::replace`]).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphModel {
  id: String,
  name: String,
  nodes: Vec<Node>,
  edges: Vec<Edge>,
}

/// An edge whose handle does not fit the target or source node's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortViolation {
  /// The source handle is not an output of the source node's kind.
  UnknownOutput { edge_id: String, handle: String },
  /// The target handle is not an input of the target node's kind.
  UnknownInput { edge_id: String, handle: String },
  /// A single-input port has more than one incoming edge.
  SharedInput {
    node_id: String,
    handle: String,
    edge_ids: Vec<String>,
  },
}

impl Default for GraphModel {
  fn default() -> Self {
    Self::new(format!("workflow-{}", uuid::Uuid::new_v4()), UNTITLED)
  }
}

impl GraphModel {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      nodes: Vec::new(),
      edges: Vec::new(),
    }
  }

  pub fn from_def(def: WorkflowDef) -> Self {
    Self {
      id: def.id,
      name: def.name,
      nodes: def.nodes,
      edges: def.edges,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  fn node_mut(&mut self, node_id: &str) -> Result<&mut Node, WorkflowError> {
    self
      .nodes
      .iter_mut()
      .find(|n| n.id == node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
  }

  /// Append a node. Ids must be unique.
  pub fn add_node(&mut self, node: Node) -> Result<(), WorkflowError> {
    if self.node(&node.id).is_some() {
      return Err(WorkflowError::DuplicateNode(node.id));
    }
    debug!(node_id = %node.id, kind = %node.kind, "node_added");
    self.nodes.push(node);
    Ok(())
  }

  /// Remove a node and every edge that starts or ends at it.
  pub fn remove_node(&mut self, node_id: &str) -> Result<Node, WorkflowError> {
    let index = self
      .nodes
      .iter()
      .position(|n| n.id == node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;
    let removed = self.nodes.remove(index);

    let before = self.edges.len();
    self.edges.retain(|e| !e.touches(node_id));
    debug!(
      node_id = %node_id,
      edges_removed = before - self.edges.len(),
      "node_removed"
    );
    Ok(removed)
  }

  /// Shallow-merge `patch` into a node's data.
  ///
  /// `status` and `executionResult` cannot be patched; they only change
  /// through the state machine.
  pub fn update_node_data(
    &mut self,
    node_id: &str,
    patch: Map<String, Value>,
  ) -> Result<(), WorkflowError> {
    if let Some(field) = RUN_STATE_FIELDS.iter().find(|f| patch.contains_key(**f)) {
      return Err(WorkflowError::RunStateField {
        node_id: node_id.to_string(),
        field: field.to_string(),
      });
    }
    let node = self.node_mut(node_id)?;
    node
      .data
      .merge(patch)
      .map_err(|source| WorkflowError::InvalidPatch {
        node_id: node_id.to_string(),
        source,
      })
  }

  /// Append an edge. Handle cardinality is not checked here; see
  /// [`GraphModel::port_violations`].
  pub fn connect(&mut self, edge: Edge) {
    debug!(
      edge_id = %edge.id,
      source = %edge.source,
      target = %edge.target,
      "edge_connected"
    );
    self.edges.push(edge);
  }

  /// Remove an edge by id.
  pub fn disconnect(&mut self, edge_id: &str) -> Option<Edge> {
    let index = self.edges.iter().position(|e| e.id == edge_id)?;
    Some(self.edges.remove(index))
  }

  /// Replace the whole graph. Used by import, which never merges.
  pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
    self.nodes = nodes;
    self.edges = edges;
  }

  /// Portable copy of the current graph.
  pub fn snapshot(&self) -> WorkflowDef {
    WorkflowDef {
      id: self.id.clone(),
      name: self.name.clone(),
      nodes: self.nodes.clone(),
      edges: self.edges.clone(),
    }
  }

  /// Build the traversal graph.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.edges)
  }

  /// The partial-run scope for re-triggering `start`.
  pub fn plan_partial_run(&self, start: &str) -> RunScope {
    let graph = self.graph();
    let scope = graph.downstream_set(start);
    debug!(
      start = %start,
      nodes = scope.len(),
      dangling_edges = graph.dangling_edges(),
      "partial_run_planned"
    );
    RunScope::Nodes(scope)
  }

  /// Move one node through the state machine.
  pub fn transition(
    &mut self,
    node_id: &str,
    transition: Transition,
  ) -> Result<NodeStatus, WorkflowError> {
    let node = self.node_mut(node_id)?;
    Ok(state::apply(node_id, &mut node.data, transition)?)
  }

  /// Reset every node in `scope` to idle with no result. Returns how many
  /// nodes were reset.
  pub fn reset_for_run(&mut self, scope: &RunScope) -> usize {
    let mut reset = 0;
    for node in self.nodes.iter_mut().filter(|n| scope.contains(&n.id)) {
      // Reset is legal from every state.
      if state::apply(&node.id, &mut node.data, Transition::Reset).is_ok() {
        reset += 1;
      }
    }
    reset
  }

  /// Edges whose handles do not match the node kind table.
  ///
  /// Advisory only: the editor and backend decide what actually runs.
  /// Nested-workflow nodes expose dynamic ports and are not checked.
  pub fn port_violations(&self) -> Vec<PortViolation> {
    let mut violations = Vec::new();
    let mut incoming: HashMap<(&str, &str), Vec<String>> = HashMap::new();

    for edge in &self.edges {
      let (Some(source), Some(target)) = (self.node(&edge.source), self.node(&edge.target))
      else {
        continue;
      };

      if let Some(handle) = edge.source_handle.as_deref() {
        let kind = source.kind;
        if kind != NodeKind::Workflow && kind.spec().output(handle).is_none() {
          violations.push(PortViolation::UnknownOutput {
            edge_id: edge.id.clone(),
            handle: handle.to_string(),
          });
        }
      }

      let Some(handle) = edge.target_handle.as_deref() else {
        continue;
      };
      if target.kind == NodeKind::Workflow {
        continue;
      }
      match target.kind.spec().input(handle) {
        None => violations.push(PortViolation::UnknownInput {
          edge_id: edge.id.clone(),
          handle: handle.to_string(),
        }),
        Some(port) if !port.multi => {
          incoming
            .entry((target.id.as_str(), port.name))
            .or_default()
            .push(edge.id.clone());
        }
        Some(_) => {}
      }
    }

    let mut shared: Vec<_> = incoming
      .into_iter()
      .filter(|(_, edge_ids)| edge_ids.len() > 1)
      .collect();
    shared.sort();
    violations.extend(
      shared
        .into_iter()
        .map(|((node_id, handle), edge_ids)| PortViolation::SharedInput {
          node_id: node_id.to_string(),
          handle: handle.to_string(),
          edge_ids,
        }),
    );
    violations
  }
}

impl From<WorkflowDef> for GraphModel {
  fn from(def: WorkflowDef) -> Self {
    Self::from_def(def)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn model() -> GraphModel {
    GraphModel::from_def(WorkflowDef {
      id: "w".to_string(),
      name: "Test".to_string(),
      nodes: vec![
        Node::new("A", NodeKind::GeminiText),
        Node::new("B", NodeKind::SpeechGen),
        Node::new("C", NodeKind::Output),
      ],
      edges: vec![Edge::new("e1", "A", "B"), Edge::new("e2", "B", "C")],
    })
  }

  fn patch(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }

  #[test]
  fn test_remove_node_drops_its_edges() {
    let mut model = model();
    model.remove_node("B").unwrap();
    assert!(model.node("B").is_none());
    assert!(model.edges().is_empty());
  }

  #[test]
  fn test_remove_every_node_leaves_no_reference() {
    for victim in ["A", "B", "C"] {
      let mut model = model();
      model.connect(Edge::new("loop", "C", "A"));
      model.remove_node(victim).unwrap();
      assert!(model.edges().iter().all(|e| !e.touches(victim)));
    }
  }

  #[test]
  fn test_remove_unknown_node() {
    let mut model = model();
    assert!(matches!(
      model.remove_node("Z"),
      Err(WorkflowError::NodeNotFound(id)) if id == "Z"
    ));
  }

  #[test]
  fn test_add_duplicate_node_rejected() {
    let mut model = model();
    let result = model.add_node(Node::new("A", NodeKind::Input));
    assert!(matches!(result, Err(WorkflowError::DuplicateNode(_))));
    assert_eq!(model.nodes().len(), 3);
  }

  #[test]
  fn test_update_node_data_preserves_other_fields() {
    let mut model = model();
    model
      .update_node_data("A", patch(json!({ "value": "a haiku about rust" })))
      .unwrap();
    let node = model.node("A").unwrap();
    assert_eq!(node.data.value, Some(json!("a haiku about rust")));
    assert_eq!(node.data.label, "Gemini Text");
    assert_eq!(node.data.config["include_thoughts"], true);
  }

  #[test]
  fn test_update_with_wrong_field_type_is_rejected() {
    let mut model = model();
    let result = model.update_node_data("A", patch(json!({ "label": 5 })));
    assert!(matches!(result, Err(WorkflowError::InvalidPatch { .. })));
    assert_eq!(model.node("A").unwrap().data.label, "Gemini Text");
  }

  #[test]
  fn test_patch_cannot_restart_completed_node() {
    let mut model = model();
    model
      .transition("A", Transition::Complete(json!("stale")))
      .unwrap();
    let before = model.node("A").unwrap().clone();

    let result = model.update_node_data("A", patch(json!({ "status": "running" })));
    assert!(matches!(
      result,
      Err(WorkflowError::RunStateField { ref field, .. }) if field == "status"
    ));
    assert_eq!(model.node("A").unwrap(), &before);
  }

  #[test]
  fn test_patch_cannot_write_execution_result() {
    let mut model = model();
    let result = model.update_node_data(
      "B",
      patch(json!({ "label": "Voice", "executionResult": { "audio": "gs://x" } })),
    );
    assert!(matches!(
      result,
      Err(WorkflowError::RunStateField { ref field, .. }) if field == "executionResult"
    ));
    let node = model.node("B").unwrap();
    assert_eq!(node.data.execution_result, None);
    assert_eq!(node.data.label, "Speech Gen");
  }

  #[test]
  fn test_connect_and_disconnect() {
    let mut model = model();
    model.connect(Edge::new("e3", "A", "C"));
    assert_eq!(model.edges().len(), 3);
    assert_eq!(model.disconnect("e3").map(|e| e.id), Some("e3".to_string()));
    assert_eq!(model.disconnect("e3"), None);
  }

  #[test]
  fn test_plan_partial_run() {
    let model = model();
    assert_eq!(
      model.plan_partial_run("B"),
      RunScope::Nodes(["B".to_string(), "C".to_string()].into())
    );
  }

  #[test]
  fn test_reset_only_touches_scope() {
    let mut model = model();
    for id in ["A", "B", "C"] {
      model
        .transition(id, Transition::Complete(json!({ "id": id })))
        .unwrap();
    }

    let reset = model.reset_for_run(&model.plan_partial_run("B"));
    assert_eq!(reset, 2);
    assert_eq!(model.node("A").unwrap().status(), NodeStatus::Completed);
    assert_eq!(model.node("B").unwrap().status(), NodeStatus::Idle);
    assert_eq!(model.node("C").unwrap().data.execution_result, None);
  }

  #[test]
  fn test_port_violations() {
    let mut model = model();
    model.add_node(Node::new("D", NodeKind::GeminiText)).unwrap();
    model.connect(Edge::new("x1", "A", "B").with_handles("text", "text"));
    model.connect(Edge::new("x2", "D", "B").with_handles("text", "text"));
    model.connect(Edge::new("x3", "B", "C").with_handles("audio", "sideways"));
    model.connect(Edge::new("x4", "C", "A").with_handles("nope", "text"));

    let violations = model.port_violations();
    assert!(violations.contains(&PortViolation::UnknownInput {
      edge_id: "x3".to_string(),
      handle: "sideways".to_string(),
    }));
    assert!(violations.contains(&PortViolation::UnknownOutput {
      edge_id: "x4".to_string(),
      handle: "nope".to_string(),
    }));
    assert!(violations.contains(&PortViolation::SharedInput {
      node_id: "B".to_string(),
      handle: "text".to_string(),
      edge_ids: vec!["x1".to_string(), "x2".to_string()],
    }));
  }

  #[test]
  fn test_editor_accepts_many_videos() {
    let mut model = GraphModel::new("w", "Ad");
    for id in ["v1", "v2"] {
      model.add_node(Node::new(id, NodeKind::VeoStandard)).unwrap();
    }
    model.add_node(Node::new("edit", NodeKind::Editor)).unwrap();
    model.connect(Edge::new("a", "v1", "edit").with_handles("video", "videos"));
    model.connect(Edge::new("b", "v2", "edit").with_handles("video", "videos"));
    assert!(model.port_violations().is_empty());
  }
}
