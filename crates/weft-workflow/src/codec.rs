//! Portable `{ nodes, edges }` documents.
//!
//! Two export flavours exist. The full one keeps every payload. The light
//! one drops run state and inline media so the file stays small enough to
//! share. Both import back to the same topology.

use serde_json::{Map, Value};
use tracing::{debug, info};
use weft_config::{GraphDocument, Node, NodeKind, WorkflowDef};

use crate::error::CodecError;
use crate::model::GraphModel;

/// Values longer than this many characters count as inline media.
pub const DEFAULT_MEDIA_THRESHOLD: usize = 500;

/// Editor-only data keys that must never be serialized.
pub const CALLBACK_FIELDS: &[&str] = &["onUpdate", "onDelete", "onRunPartial", "onChange"];

/// Input-node keys that only make sense on the machine that produced them.
const LOCAL_INPUT_FIELDS: &[&str] = &["fileName", "lastRun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
  /// Keep run results, statuses and large inline values.
  pub include_media: bool,
  pub media_threshold: usize,
}

impl Default for ExportOptions {
  fn default() -> Self {
    Self {
      include_media: true,
      media_threshold: DEFAULT_MEDIA_THRESHOLD,
    }
  }
}

impl ExportOptions {
  pub fn full() -> Self {
    Self::default()
  }

  pub fn light() -> Self {
    Self {
      include_media: false,
      ..Self::default()
    }
  }

  pub fn with_threshold(mut self, media_threshold: usize) -> Self {
    self.media_threshold = media_threshold;
    self
  }

  /// The file name the editor uses for this flavour.
  pub fn file_name(&self) -> &'static str {
    if self.include_media {
      "workflow_full.json"
    } else {
      "workflow_light.json"
    }
  }
}

/// Whether `value` looks like an inline media payload: a data URI, or a
/// string longer than `threshold` characters.
pub fn is_inline_media(value: &Value, threshold: usize) -> bool {
  match value {
    Value::String(s) => s.starts_with("data:") || s.chars().count() > threshold,
    _ => false,
  }
}

/// Remove editor-only callback keys from a node's data.
pub fn strip_callbacks(node: &mut Node) {
  for field in CALLBACK_FIELDS {
    node.data.extra.remove(*field);
  }
}

fn strip_media(node: &mut Node, threshold: usize) {
  node.data.execution_result = None;
  node.data.status = None;
  if node
    .data
    .value
    .as_ref()
    .is_some_and(|v| is_inline_media(v, threshold))
  {
    node.data.value = Some(Value::String(String::new()));
  }
  if node.kind == NodeKind::Input {
    for field in LOCAL_INPUT_FIELDS {
      node.data.extra.remove(*field);
    }
  }
}

/// Workflow snapshot safe to send over the wire.
pub fn portable(model: &GraphModel) -> WorkflowDef {
  let mut def = model.snapshot();
  def.nodes.iter_mut().for_each(strip_callbacks);
  def
}

/// Export the graph as a document.
pub fn export(model: &GraphModel, options: ExportOptions) -> GraphDocument {
  let mut document = GraphDocument::from(portable(model));
  if !options.include_media {
    for node in &mut document.nodes {
      strip_media(node, options.media_threshold);
    }
  }
  debug!(
    nodes = document.nodes.len(),
    edges = document.edges.len(),
    include_media = options.include_media,
    "workflow_exported"
  );
  document
}

/// Export the graph as pretty-printed JSON.
pub fn export_json(model: &GraphModel, options: ExportOptions) -> Result<String, CodecError> {
  Ok(serde_json::to_string_pretty(&export(model, options))?)
}

/// A validated import document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDocument {
  /// Present when the file is a full saved workflow rather than a bare graph.
  pub id: Option<String>,
  pub name: Option<String>,
  pub graph: GraphDocument,
}

/// Validate and decode a document.
///
/// The top level must be an object with `nodes` and `edges` arrays. Callback
/// keys are dropped from node data before decoding.
pub fn parse_document(raw: &str) -> Result<ImportedDocument, CodecError> {
  let value: Value = serde_json::from_str(raw)?;
  parse_value(value)
}

/// Same as [`parse_document`] for an already parsed value.
pub fn parse_value(value: Value) -> Result<ImportedDocument, CodecError> {
  let Value::Object(mut root) = value else {
    return Err(CodecError::NotAnObject);
  };

  let mut nodes = take_array(&mut root, "nodes")?;
  let edges = take_array(&mut root, "edges")?;

  for node in &mut nodes {
    if let Some(Value::Object(data)) = node.get_mut("data") {
      for field in CALLBACK_FIELDS {
        data.remove(*field);
      }
    }
  }

  let graph = GraphDocument {
    nodes: serde_json::from_value(Value::Array(nodes))?,
    edges: serde_json::from_value(Value::Array(edges))?,
  };

  Ok(ImportedDocument {
    id: string_field(&root, "id"),
    name: string_field(&root, "name"),
    graph,
  })
}

fn take_array(root: &mut Map<String, Value>, key: &'static str) -> Result<Vec<Value>, CodecError> {
  match root.remove(key) {
    Some(Value::Array(items)) => Ok(items),
    _ => Err(CodecError::MissingCollection(key)),
  }
}

fn string_field(root: &Map<String, Value>, key: &str) -> Option<String> {
  root.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Replace the model's contents with a document. Never merges.
///
/// On error the model is left untouched.
pub fn import(model: &mut GraphModel, raw: &str) -> Result<(), CodecError> {
  let document = parse_document(raw)?;
  apply(model, document);
  Ok(())
}

/// Replace the model's contents with an already decoded document.
pub fn apply(model: &mut GraphModel, document: ImportedDocument) {
  if let Some(name) = document.name {
    model.set_name(name);
  }
  let GraphDocument { nodes, edges } = document.graph;
  info!(nodes = nodes.len(), edges = edges.len(), "workflow_imported");
  model.replace(nodes, edges);
}
