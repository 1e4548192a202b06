use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use weft_workflow::codec::DEFAULT_MEDIA_THRESHOLD;

const SETTINGS_FILE: &str = "settings.json";

/// Client settings, read from `<data_dir>/settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Backend origin, e.g. `http://localhost:8000`.
  pub base_url: String,
  /// Let the backend reuse cached node results.
  pub use_cache: bool,
  /// Length above which a `value` is dropped from light exports.
  pub media_threshold: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000".to_string(),
      use_cache: false,
      media_threshold: DEFAULT_MEDIA_THRESHOLD,
    }
  }
}

impl Settings {
  pub fn path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
  }

  /// Load settings. A missing file means defaults.
  pub fn load(data_dir: &Path) -> Result<Self> {
    let path = Self::path(data_dir);
    if !path.exists() {
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read settings file: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse settings file: {}", path.display()))
  }
}
