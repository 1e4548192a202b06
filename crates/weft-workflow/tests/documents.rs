use serde_json::json;
use weft_config::{Edge, MediaType, Node, NodeKind, NodeStatus, Position, WorkflowDef};
use weft_workflow::codec::{self, ExportOptions};
use weft_workflow::{GraphIntent, GraphModel, RunScope, Transition};

/// A product-ad style graph: photo and brief feed a video and a voiceover,
/// both land in the editor.
fn ad_workflow() -> GraphModel {
  let mut model = GraphModel::new("workflow-ad", "Product Ad");
  let nodes = [
    Node::new("photo", NodeKind::Input).with_value("data:image/png;base64,iVBORw0KGgo="),
    Node::new("brief", NodeKind::Input).with_value("A refreshing summer drink"),
    Node::new("stylize", NodeKind::GeminiImage),
    Node::new("video", NodeKind::VeoStandard),
    Node::new("script", NodeKind::GeminiText),
    Node::new("voice", NodeKind::SpeechGen),
    Node::new("edit", NodeKind::Editor),
    Node::new("out", NodeKind::Output),
  ];
  for node in nodes {
    model.dispatch(GraphIntent::NodeAdded(node)).unwrap();
  }
  let edges = [
    ("e1", "photo", "stylize", "output", "image"),
    ("e2", "stylize", "video", "image", "first_frame"),
    ("e3", "brief", "script", "output", "text"),
    ("e4", "script", "voice", "text", "text"),
    ("e5", "video", "edit", "video", "videos"),
    ("e6", "voice", "edit", "audio", "speech"),
    ("e7", "edit", "out", "video", "input"),
  ];
  for (id, source, target, source_handle, target_handle) in edges {
    model
      .dispatch(GraphIntent::EdgeConnected(
        Edge::new(id, source, target).with_handles(source_handle, target_handle),
      ))
      .unwrap();
  }
  model
}

#[test]
fn test_ad_workflow_has_no_port_violations() {
  assert!(ad_workflow().port_violations().is_empty());
}

#[test]
fn test_partial_run_from_script() {
  let model = ad_workflow();
  let scope = model.plan_partial_run("script");
  assert_eq!(
    scope,
    RunScope::Nodes(
      ["script", "voice", "edit", "out"]
        .iter()
        .map(|s| s.to_string())
        .collect()
    )
  );
}

#[test]
fn test_light_export_round_trip_after_run() {
  let mut model = ad_workflow();
  for id in ["photo", "brief", "stylize", "video", "script", "voice", "edit"] {
    model
      .transition(id, Transition::Complete(json!({ "output": format!("gs://bucket/{}", id) })))
      .unwrap();
  }
  model
    .transition("out", Transition::Fail(json!({ "error": "render timeout" })))
    .unwrap();

  let light = codec::export_json(&model, ExportOptions::light()).unwrap();
  let mut restored = GraphModel::default();
  codec::import(&mut restored, &light).unwrap();

  assert_eq!(restored.edges(), model.edges());
  for (before, after) in model.nodes().iter().zip(restored.nodes()) {
    assert_eq!(before.id, after.id);
    assert_eq!(before.kind, after.kind);
    assert_eq!(before.data.config, after.data.config);
    assert_eq!(after.status(), NodeStatus::Idle);
    assert_eq!(after.data.execution_result, None);
  }
  assert_eq!(restored.node("photo").unwrap().data.value, Some(json!("")));
  assert_eq!(
    restored.node("brief").unwrap().data.value,
    Some(json!("A refreshing summer drink"))
  );

  let full = codec::export_json(&model, ExportOptions::full()).unwrap();
  let mut restored = GraphModel::default();
  codec::import(&mut restored, &full).unwrap();
  assert_eq!(restored.nodes(), model.nodes());
}

#[test]
fn test_saved_workflow_file_imports() {
  let saved = WorkflowDef::sample();
  let raw = serde_json::to_string(&saved).unwrap();

  let mut model = GraphModel::default();
  codec::import(&mut model, &raw).unwrap();
  assert_eq!(model.name(), saved.name);
  assert_eq!(model.nodes(), saved.nodes.as_slice());
}

#[test]
fn test_dropped_node_round_trips() {
  let mut model = GraphModel::new("w", "Canvas");
  let node = Node::of_kind(NodeKind::Output, MediaType::Video, Position::new(300.0, 40.0));
  let id = node.id.clone();
  model.dispatch(GraphIntent::NodeAdded(node)).unwrap();

  let json = codec::export_json(&model, ExportOptions::full()).unwrap();
  let mut restored = GraphModel::default();
  codec::import(&mut restored, &json).unwrap();

  let restored = restored.node(&id).unwrap();
  assert_eq!(restored.data.label, "Video Output");
  assert_eq!(restored.data.extra["outputType"], "video");
  assert_eq!(restored.position, Position::new(300.0, 40.0));
}
