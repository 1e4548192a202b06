//! The execution stream client.
//!
//! One run at a time per client: reset the scope, post the snapshot, then
//! read the event stream until a terminal event, the `[DONE]` sentinel, or
//! the connection closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use weft_config::WorkflowDef;
use weft_http::HttpClient;
use weft_workflow::{GraphModel, RunScope, codec};

use crate::cancel::CancellationController;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::projection::{Projected, Projection};
use crate::sse::{RecordDecoder, StreamRecord, parse_record};

/// Body of `POST /api/workflow/execute/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
  pub workflow: WorkflowDef,
  pub node_ids: Option<Vec<String>>,
  pub use_cache: bool,
  pub execution_id: String,
}

/// How a run's stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  /// `workflow_completed`.
  Completed,
  /// `execution_cancelled`.
  Cancelled,
  /// The `[DONE]` sentinel.
  Done,
  /// The stream ended with no terminal marker.
  Closed,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
  pub execution_id: String,
  pub outcome: RunOutcome,
  /// Nodes whose last terminal event was a completion.
  pub completed: usize,
  /// Nodes whose last terminal event was a failure.
  pub failed: usize,
  /// Data records that could not be decoded.
  pub skipped_records: usize,
}

/// Clears the in-flight flag and the execution id however the run ends,
/// including when the run future is dropped mid-stream.
struct InFlight<'a> {
  running: &'a AtomicBool,
  controller: &'a CancellationController,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.controller.set(None);
    self.running.store(false, Ordering::SeqCst);
  }
}

pub struct ExecutionClient {
  http: HttpClient,
  controller: CancellationController,
  notifier: Arc<dyn ExecutionNotifier>,
  running: AtomicBool,
  use_cache: bool,
}

impl ExecutionClient {
  pub fn new(http: HttpClient) -> Self {
    Self {
      controller: CancellationController::new(http.clone()),
      http,
      notifier: Arc::new(NoopNotifier),
      running: AtomicBool::new(false),
      use_cache: false,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// Let the backend serve unchanged nodes from its cache.
  pub fn with_cache(mut self, use_cache: bool) -> Self {
    self.use_cache = use_cache;
    self
  }

  pub fn is_running(&self) -> bool {
    self.running.load(Ordering::SeqCst)
  }

  /// A handle for cancelling whatever this client is running.
  pub fn controller(&self) -> CancellationController {
    self.controller.clone()
  }

  /// Run every node.
  pub async fn run(&self, model: &mut GraphModel) -> Result<RunSummary, ExecutionError> {
    self
      .run_scoped(model, RunScope::All, CancellationToken::new())
      .await
  }

  /// Re-run `start` and everything downstream of it.
  pub async fn run_partial(
    &self,
    model: &mut GraphModel,
    start: &str,
  ) -> Result<RunSummary, ExecutionError> {
    if model.node(start).is_none() {
      return Err(ExecutionError::UnknownNode(start.to_string()));
    }
    let scope = model.plan_partial_run(start);
    self
      .run_scoped(model, scope, CancellationToken::new())
      .await
  }

  /// Run `scope`, sending a cancel signal when `cancel` fires.
  ///
  /// Firing `cancel` does not end the run: reading continues until the
  /// backend acknowledges or the stream closes.
  pub async fn run_scoped(
    &self,
    model: &mut GraphModel,
    scope: RunScope,
    cancel: CancellationToken,
  ) -> Result<RunSummary, ExecutionError> {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      warn!(workflow_id = %model.id(), "execution_rejected_already_running");
      return Err(ExecutionError::AlreadyRunning);
    }
    let _in_flight = InFlight {
      running: &self.running,
      controller: &self.controller,
    };

    let execution_id = uuid::Uuid::new_v4().to_string();
    self.controller.set(Some(execution_id.clone()));

    let result = self.execute(model, scope, &execution_id, cancel).await;
    if let Err(e) = &result {
      error!(execution_id = %execution_id, error = %e, "execution_failed");
    }
    result
  }

  #[instrument(
    name = "workflow_execute",
    skip(self, model, scope, cancel),
    fields(workflow_id = %model.id(), execution_id = %execution_id)
  )]
  async fn execute(
    &self,
    model: &mut GraphModel,
    scope: RunScope,
    execution_id: &str,
    cancel: CancellationToken,
  ) -> Result<RunSummary, ExecutionError> {
    let reset = model.reset_for_run(&scope);
    let request = ExecutionRequest {
      workflow: codec::portable(model),
      node_ids: scope.node_ids(),
      use_cache: self.use_cache,
      execution_id: execution_id.to_string(),
    };
    info!(
      execution_id = %execution_id,
      nodes_reset = reset,
      partial = request.node_ids.is_some(),
      use_cache = request.use_cache,
      "workflow_started"
    );

    let mut stream = self
      .http
      .post_stream(&["api", "workflow", "execute", "stream"], &request)
      .await?;
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.to_string(),
      node_ids: request.node_ids.clone(),
    });

    let mut decoder = RecordDecoder::new();
    let mut projection = Projection::new(execution_id);
    let mut skipped = 0;
    let mut cancel_sent = false;

    let outcome = 'read: loop {
      let chunk = tokio::select! {
        biased;
        _ = cancel.cancelled(), if !cancel_sent => {
          cancel_sent = true;
          match self.controller.cancel().await {
            Ok(sent) => info!(execution_id = %execution_id, sent, "cancel_requested"),
            Err(e) => warn!(execution_id = %execution_id, error = %e, "cancel_request_failed"),
          }
          continue;
        }
        chunk = stream.next() => chunk,
      };

      let Some(chunk) = chunk else {
        // Closed; a final record may lack its separator.
        if let Some(record) = decoder.finish() {
          if let Some(outcome) = self.handle(model, &mut projection, &record, &mut skipped) {
            break 'read outcome;
          }
        }
        break 'read RunOutcome::Closed;
      };
      let chunk = chunk?;

      for record in decoder.push(&chunk) {
        if let Some(outcome) = self.handle(model, &mut projection, &record, &mut skipped) {
          break 'read outcome;
        }
      }
    };

    let summary = RunSummary {
      execution_id: execution_id.to_string(),
      outcome,
      completed: projection.completed(),
      failed: projection.failed(),
      skipped_records: skipped,
    };
    info!(
      execution_id = %execution_id,
      outcome = ?summary.outcome,
      completed = summary.completed,
      failed = summary.failed,
      skipped_records = summary.skipped_records,
      "execution_stream_closed"
    );
    self.notifier.notify(ExecutionEvent::RunFinished {
      execution_id: execution_id.to_string(),
      outcome,
    });
    Ok(summary)
  }

  /// Process one raw record. Returns the outcome if it ends the run.
  fn handle(
    &self,
    model: &mut GraphModel,
    projection: &mut Projection,
    record: &str,
    skipped: &mut usize,
  ) -> Option<RunOutcome> {
    let event = match parse_record(record) {
      Ok(None) => {
        debug!(record = %record, "stream_record_ignored");
        return None;
      }
      Ok(Some(StreamRecord::Done)) => return Some(RunOutcome::Done),
      Ok(Some(StreamRecord::Event(event))) => event,
      Err(e) => {
        warn!(record = %record, error = %e, "stream_record_skipped");
        *skipped += 1;
        return None;
      }
    };

    match projection.apply(model, event) {
      Projected::Node(event) => {
        self.notifier.notify(event);
        None
      }
      Projected::Ignored => None,
      Projected::Terminal { cancelled: true } => Some(RunOutcome::Cancelled),
      Projected::Terminal { cancelled: false } => Some(RunOutcome::Completed),
    }
  }
}
