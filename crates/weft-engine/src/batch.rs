use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use weft_http::HttpClient;

use crate::error::ExecutionError;

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
  inputs: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
  #[serde(default)]
  results: Vec<Value>,
}

/// Run a saved workflow once per input, non-streaming.
///
/// The backend feeds each input to the workflow's input nodes and returns
/// one result per input, in input order.
pub async fn run_batch(
  http: &HttpClient,
  workflow_id: &str,
  inputs: &[Value],
) -> Result<Vec<Value>, ExecutionError> {
  info!(workflow_id = %workflow_id, inputs = inputs.len(), "batch_started");
  let response: BatchResponse = http
    .post_json(&["api", "workflow", workflow_id, "batch"], &BatchRequest { inputs })
    .await?;
  info!(
    workflow_id = %workflow_id,
    results = response.results.len(),
    "batch_completed"
  );
  Ok(response.results)
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};
  use serde_json::json;

  #[tokio::test]
  async fn test_batch_posts_inputs() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("POST", "/api/workflow/workflow-9/batch")
      .match_body(Matcher::Json(json!({ "inputs": ["cats", "dogs"] })))
      .with_status(200)
      .with_body(r#"{"results":[{"text":"meow"},{"text":"woof"}]}"#)
      .create_async()
      .await;

    let http = HttpClient::new(&server.url()).unwrap();
    let results = run_batch(&http, "workflow-9", &[json!("cats"), json!("dogs")])
      .await
      .unwrap();
    assert_eq!(results, vec![json!({ "text": "meow" }), json!({ "text": "woof" })]);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_batch_unknown_workflow() {
    let mut server = Server::new_async().await;
    server
      .mock("POST", "/api/workflow/missing/batch")
      .with_status(404)
      .create_async()
      .await;

    let http = HttpClient::new(&server.url()).unwrap();
    let result = run_batch(&http, "missing", &[]).await;
    assert!(matches!(result, Err(ExecutionError::Transport(_))));
  }
}
