use thiserror::Error;
use weft_http::HttpError;

#[derive(Debug, Error)]
pub enum ExecutionError {
  /// A run was requested while another is still streaming on this client.
  #[error("an execution is already in progress")]
  AlreadyRunning,

  #[error("node not found: {0}")]
  UnknownNode(String),

  /// The request could not be sent, the backend refused it, or the stream
  /// broke mid-run.
  #[error("execution transport failed: {0}")]
  Transport(#[from] HttpError),
}
