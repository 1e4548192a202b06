//! Node kinds and their behavior table.
//!
//! Every kind maps to a static [`KindSpec`] describing its ports and the
//! config it starts with. Adding a kind is one variant plus one table entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The closed set of node kinds the editor and backend understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Input,
  Output,
  GeminiText,
  GeminiImage,
  ImagenUpscale,
  SpeechGen,
  LyriaGen,
  VeoStandard,
  VeoExtend,
  VeoReference,
  Editor,
  /// A nested, previously saved workflow.
  Workflow,
}

/// Media flavour of an input or output node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
  #[default]
  Text,
  Image,
  Video,
  Audio,
}

/// A named port on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
  pub name: &'static str,
  /// Whether more than one edge may target this port. Only meaningful for inputs.
  pub multi: bool,
}

/// Static behavior of a node kind.
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
  pub kind: NodeKind,
  /// Wire name, as serde writes it.
  pub name: &'static str,
  pub label: &'static str,
  pub inputs: &'static [PortSpec],
  pub outputs: &'static [PortSpec],
  /// Config a freshly created node starts with.
  pub config: fn() -> Value,
}

const fn port(name: &'static str) -> PortSpec {
  PortSpec { name, multi: false }
}

const fn multi(name: &'static str) -> PortSpec {
  PortSpec { name, multi: true }
}

const NO_PORTS: &[PortSpec] = &[];
const GEMINI_INPUTS: &[PortSpec] = &[port("text"), port("image"), port("other")];
const VEO_INPUTS: &[PortSpec] = &[
  port("text"),
  port("first_frame"),
  port("last_frame"),
  port("video"),
  port("next_video"),
  port("image"),
];

fn empty_config() -> Value {
  json!({})
}

fn gemini_text_config() -> Value {
  json!({ "use_google_search": false, "include_thoughts": true })
}

fn gemini_image_config() -> Value {
  json!({ "aspect_ratio": "1:1" })
}

fn upscale_config() -> Value {
  json!({ "upscale_factor": "x2" })
}

fn speech_config() -> Value {
  json!({ "model_id": "gemini-2.5-flash-tts", "voice_name": "Kore" })
}

fn veo_config() -> Value {
  json!({
    "aspect_ratio": "16:9",
    "resolution": "720p",
    "duration_seconds": 8,
    "generate_audio": false
  })
}

fn editor_config() -> Value {
  json!({ "sequence": { "videos": [], "speech": [], "background": [] } })
}

const KINDS: &[KindSpec] = &[
  KindSpec {
    kind: NodeKind::Input,
    name: "input",
    label: "Text Input",
    inputs: NO_PORTS,
    outputs: &[port("output")],
    config: empty_config,
  },
  KindSpec {
    kind: NodeKind::Output,
    name: "output",
    label: "Text Output",
    inputs: &[port("input")],
    outputs: NO_PORTS,
    config: empty_config,
  },
  KindSpec {
    kind: NodeKind::GeminiText,
    name: "gemini_text",
    label: "Gemini Text",
    inputs: GEMINI_INPUTS,
    outputs: &[port("text")],
    config: gemini_text_config,
  },
  KindSpec {
    kind: NodeKind::GeminiImage,
    name: "gemini_image",
    label: "Gemini Image",
    inputs: GEMINI_INPUTS,
    outputs: &[port("image")],
    config: gemini_image_config,
  },
  KindSpec {
    kind: NodeKind::ImagenUpscale,
    name: "imagen_upscale",
    label: "Image Upscaler",
    inputs: &[port("image")],
    outputs: &[port("image")],
    config: upscale_config,
  },
  KindSpec {
    kind: NodeKind::SpeechGen,
    name: "speech_gen",
    label: "Speech Gen",
    inputs: &[port("text")],
    outputs: &[port("audio")],
    config: speech_config,
  },
  KindSpec {
    kind: NodeKind::LyriaGen,
    name: "lyria_gen",
    label: "Lyria Music",
    inputs: &[port("text")],
    outputs: &[port("audio")],
    config: empty_config,
  },
  KindSpec {
    kind: NodeKind::VeoStandard,
    name: "veo_standard",
    label: "Veo Standard",
    inputs: VEO_INPUTS,
    outputs: &[port("video")],
    config: veo_config,
  },
  KindSpec {
    kind: NodeKind::VeoExtend,
    name: "veo_extend",
    label: "Veo Extend",
    inputs: VEO_INPUTS,
    outputs: &[port("video")],
    config: veo_config,
  },
  KindSpec {
    kind: NodeKind::VeoReference,
    name: "veo_reference",
    label: "Veo Reference",
    inputs: VEO_INPUTS,
    outputs: &[port("video")],
    config: veo_config,
  },
  KindSpec {
    kind: NodeKind::Editor,
    name: "editor",
    label: "Video Editor",
    inputs: &[multi("videos"), multi("speech"), multi("background")],
    outputs: &[port("video")],
    config: editor_config,
  },
  KindSpec {
    kind: NodeKind::Workflow,
    name: "workflow",
    label: "Workflow",
    inputs: &[multi("input")],
    outputs: &[port("output")],
    config: empty_config,
  },
];

impl NodeKind {
  /// All kinds, in table order.
  pub fn all() -> impl Iterator<Item = NodeKind> {
    KINDS.iter().map(|spec| spec.kind)
  }

  /// The behavior table entry for this kind.
  pub fn spec(self) -> &'static KindSpec {
    // KINDS is laid out in variant declaration order.
    &KINDS[self as usize]
  }

  /// Wire name, e.g. `"speech_gen"`.
  pub fn as_str(self) -> &'static str {
    self.spec().name
  }

  /// Default label. Input and output nodes are labelled by their media type.
  pub fn default_label(self, media: MediaType) -> &'static str {
    match (self, media) {
      (NodeKind::Input, MediaType::Text) => "Text Input",
      (NodeKind::Input, MediaType::Image) => "Image Input",
      (NodeKind::Input, MediaType::Video) => "Video Input",
      (NodeKind::Input, MediaType::Audio) => "Audio Input",
      (NodeKind::Output, MediaType::Text) => "Text Output",
      (NodeKind::Output, MediaType::Image) => "Image Output",
      (NodeKind::Output, MediaType::Video) => "Video Output",
      (NodeKind::Output, MediaType::Audio) => "Audio Output",
      (kind, _) => kind.spec().label,
    }
  }

  /// Config a freshly created node of this kind starts with.
  pub fn default_config(self) -> Map<String, Value> {
    match (self.spec().config)() {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }

  /// Whether this kind carries a media subtype (`inputType` / `outputType`).
  pub fn has_media_type(self) -> bool {
    matches!(self, NodeKind::Input | NodeKind::Output)
  }
}

impl KindSpec {
  pub fn input(&self, name: &str) -> Option<&PortSpec> {
    self.inputs.iter().find(|p| p.name == name)
  }

  pub fn output(&self, name: &str) -> Option<&PortSpec> {
    self.outputs.iter().find(|p| p.name == name)
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
