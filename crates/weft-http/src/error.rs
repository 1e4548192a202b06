use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
  #[error("invalid base url '{url}'")]
  InvalidUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("base url '{0}' cannot carry a path")]
  NotABase(String),

  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("{url} responded with status {status}: {body}")]
  Status { url: String, status: u16, body: String },

  #[error("could not decode response from {url}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },
}

impl HttpError {
  /// The HTTP status, if the server answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      HttpError::Status { status, .. } => Some(*status),
      HttpError::Request(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }
}
