use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};
use weft_http::{HttpClient, HttpError};

/// Holds the id of the execution currently streaming, if any, and sends
/// cancel signals for it.
///
/// Cancelling never stops the local read loop. The run ends when the
/// backend emits `execution_cancelled` or closes the stream. Clones share
/// the same slot, so a handle can be passed to a signal handler while the
/// run borrows the client.
#[derive(Debug, Clone)]
pub struct CancellationController {
  http: HttpClient,
  current: Arc<Mutex<Option<String>>>,
}

impl CancellationController {
  pub fn new(http: HttpClient) -> Self {
    Self {
      http,
      current: Arc::new(Mutex::new(None)),
    }
  }

  fn slot(&self) -> MutexGuard<'_, Option<String>> {
    self
      .current
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// The id of the in-flight execution.
  pub fn current(&self) -> Option<String> {
    self.slot().clone()
  }

  pub(crate) fn set(&self, execution_id: Option<String>) {
    *self.slot() = execution_id;
  }

  /// Ask the backend to cancel the in-flight execution.
  ///
  /// Returns `Ok(false)` without any request when nothing is running, and
  /// `Ok(false)` when the backend answers with a non-success status (it
  /// does so for executions it no longer knows about).
  pub async fn cancel(&self) -> Result<bool, HttpError> {
    let Some(execution_id) = self.current() else {
      return Ok(false);
    };
    self.cancel_id(&execution_id).await
  }

  /// Send a cancel signal for an explicit execution id.
  pub async fn cancel_id(&self, execution_id: &str) -> Result<bool, HttpError> {
    let response = self
      .http
      .post_raw::<()>(
        &["api", "workflow", "execute", "cancel", execution_id],
        None,
      )
      .await?;

    let status = response.status();
    if status.is_success() {
      info!(execution_id = %execution_id, "cancel_signal_sent");
      Ok(true)
    } else {
      warn!(
        execution_id = %execution_id,
        status = status.as_u16(),
        "cancel_signal_rejected"
      );
      Ok(false)
    }
  }
}
