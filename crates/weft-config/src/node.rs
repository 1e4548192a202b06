use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::{MediaType, NodeKind};
use crate::status::NodeStatus;

/// Canvas position. Carried through documents but never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Per-node payload.
///
/// Fields the core reads are typed; everything else a node kind stores
/// (`model`, `inputType`, `workflow_id`, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
  #[serde(default)]
  pub label: String,

  /// Text, data URI, or URI depending on the node kind.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,

  /// Kind-specific options.
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub config: Map<String, Value>,

  /// Absent is equivalent to idle.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<NodeStatus>,

  #[serde(
    rename = "executionResult",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub execution_result: Option<Value>,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl NodeData {
  pub fn labelled(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      ..Default::default()
    }
  }

  /// Effective status, treating an absent status as idle.
  pub fn status(&self) -> NodeStatus {
    self.status.unwrap_or_default()
  }

  /// Shallow-merge a JSON object into this data.
  ///
  /// Keys in `patch` replace the corresponding top-level field wholesale
  /// (a patched `config` replaces the whole config map); keys not in `patch`
  /// are left untouched.
  pub fn merge(&mut self, patch: Map<String, Value>) -> Result<(), serde_json::Error> {
    let mut current = match serde_json::to_value(&*self)? {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    for (key, value) in patch {
      current.insert(key, value);
    }
    *self = serde_json::from_value(Value::Object(current))?;
    Ok(())
  }
}

/// A unit of work in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: NodeKind,
  #[serde(default)]
  pub position: Position,
  #[serde(default)]
  pub data: NodeData,
}

impl Node {
  /// A node with the given id and the kind's default label and config.
  pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
    let mut data = NodeData::labelled(kind.default_label(MediaType::default()));
    data.config = kind.default_config();
    Self {
      id: id.into(),
      kind,
      position: Position::default(),
      data,
    }
  }

  /// A freshly created node as the editor would drop it on the canvas:
  /// random id, default label and config, empty value.
  pub fn of_kind(kind: NodeKind, media: MediaType, position: Position) -> Self {
    let mut data = NodeData::labelled(kind.default_label(media));
    data.value = Some(Value::String(String::new()));
    data.config = kind.default_config();
    data
      .extra
      .insert("type".to_string(), Value::String(kind.as_str().to_string()));

    if kind.has_media_type() {
      let key = if kind == NodeKind::Input {
        "inputType"
      } else {
        "outputType"
      };
      if let Ok(media) = serde_json::to_value(media) {
        data.extra.insert(key.to_string(), media);
      }
    }

    Self {
      id: uuid::Uuid::new_v4().to_string(),
      kind,
      position,
      data,
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.data.label = label.into();
    self
  }

  pub fn with_value(mut self, value: impl Into<Value>) -> Self {
    self.data.value = Some(value.into());
    self
  }

  pub fn with_position(mut self, x: f64, y: f64) -> Self {
    self.position = Position::new(x, y);
    self
  }

  pub fn status(&self) -> NodeStatus {
    self.data.status()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_absent_status_is_idle() {
    let node: Node = serde_json::from_value(json!({
      "id": "1",
      "type": "gemini_text",
      "position": { "x": 100.0, "y": 100.0 },
      "data": { "label": "Start Idea", "value": "Explain quantum computing in 5 words" }
    }))
    .unwrap();
    assert_eq!(node.status(), NodeStatus::Idle);
    assert_eq!(node.data.status, None);
  }

  #[test]
  fn test_unknown_data_fields_survive_round_trip() {
    let raw = json!({
      "id": "3",
      "type": "output",
      "position": { "x": 900.0, "y": 100.0 },
      "data": { "label": "Audio Output", "outputType": "audio", "model": "" }
    });
    let node: Node = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(node.data.extra["outputType"], "audio");
    assert_eq!(serde_json::to_value(&node).unwrap(), raw);
  }

  #[test]
  fn test_execution_result_uses_camel_case() {
    let mut node = Node::new("b", NodeKind::SpeechGen);
    node.data.execution_result = Some(json!({ "text": "hi" }));
    node.data.status = Some(NodeStatus::Completed);
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["data"]["executionResult"]["text"], "hi");
    assert_eq!(value["data"]["status"], "completed");
  }

  #[test]
  fn test_merge_is_shallow() {
    let mut data = NodeData::labelled("Narrate");
    data.config.insert("voice_name".to_string(), json!("Kore"));
    data.value = Some(json!("hello"));

    let patch = json!({ "config": { "model_id": "tts" }, "label": "Voice" });
    let Value::Object(patch) = patch else {
      unreachable!()
    };
    data.merge(patch).unwrap();

    assert_eq!(data.label, "Voice");
    assert_eq!(data.value, Some(json!("hello")));
    assert_eq!(data.config.get("voice_name"), None);
    assert_eq!(data.config["model_id"], "tts");
  }

  #[test]
  fn test_merge_into_extra_fields() {
    let mut data = NodeData::labelled("Gemini Text");
    let Value::Object(patch) = json!({ "model": "gemini-3-pro-preview" }) else {
      unreachable!()
    };
    data.merge(patch).unwrap();
    assert_eq!(data.extra["model"], "gemini-3-pro-preview");
  }

  #[test]
  fn test_of_kind_sets_media_type() {
    let node = Node::of_kind(NodeKind::Input, MediaType::Image, Position::new(1.0, 2.0));
    assert_eq!(node.data.label, "Image Input");
    assert_eq!(node.data.extra["inputType"], "image");
    assert_eq!(node.data.extra["type"], "input");
    assert_eq!(node.data.value, Some(json!("")));
    assert!(!node.id.is_empty());

    let other = Node::of_kind(NodeKind::Input, MediaType::Image, Position::default());
    assert_ne!(node.id, other.id);
  }
}
