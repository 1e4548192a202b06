use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use weft_config::WorkflowDef;

/// A catalog entry as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
  pub id: String,
  pub name: String,
  #[serde(deserialize_with = "timestamp")]
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowList {
  pub workflows: Vec<WorkflowSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateList {
  pub workflows: Vec<WorkflowDef>,
}

/// `{status, id}` reply from save and import.
#[derive(Debug, Deserialize)]
pub(crate) struct Saved {
  pub id: String,
}

/// `{status, message}` reply from maintenance endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMessage {
  pub status: String,
  #[serde(default)]
  pub message: String,
}

/// Accepts RFC 3339 and offset-less ISO timestamps; the latter are UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
    return Ok(with_offset.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
    .map(|naive| naive.and_utc())
    .map_err(serde::de::Error::custom)
}
