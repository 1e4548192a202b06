use async_trait::async_trait;
use tracing::info;
use weft_config::WorkflowDef;
use weft_http::HttpClient;

use crate::types::{Saved, StatusMessage, TemplateList, WorkflowList, WorkflowSummary};
use crate::{StoreError, WorkflowStore};

const ROOT: &str = "api";
const WORKFLOW: &str = "workflow";

/// [`WorkflowStore`] backed by the backend's `/api/workflow` routes.
#[derive(Debug, Clone)]
pub struct HttpStore {
  http: HttpClient,
}

impl HttpStore {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }
}

#[async_trait]
impl WorkflowStore for HttpStore {
  async fn save(&self, workflow: &WorkflowDef) -> Result<String, StoreError> {
    let saved: Saved = self
      .http
      .post_json(&[ROOT, WORKFLOW, "save"], workflow)
      .await?;
    info!(workflow_id = %saved.id, "workflow_saved");
    Ok(saved.id)
  }

  async fn import(&self, workflow: &WorkflowDef) -> Result<String, StoreError> {
    let saved: Saved = self
      .http
      .post_json(&[ROOT, WORKFLOW, "import"], workflow)
      .await?;
    info!(workflow_id = %saved.id, "workflow_imported_remote");
    Ok(saved.id)
  }

  async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
    let list: WorkflowList = self.http.get_json(&[ROOT, WORKFLOW, "list"]).await?;
    Ok(list.workflows)
  }

  async fn get(&self, workflow_id: &str) -> Result<WorkflowDef, StoreError> {
    self
      .http
      .get_json(&[ROOT, WORKFLOW, workflow_id])
      .await
      .map_err(|e| match e.status() {
        Some(404) => StoreError::NotFound(workflow_id.to_string()),
        _ => StoreError::Http(e),
      })
  }

  async fn templates(&self) -> Result<Vec<WorkflowDef>, StoreError> {
    let list: TemplateList = self
      .http
      .get_json(&[ROOT, WORKFLOW, "templates", "examples"])
      .await?;
    Ok(list.workflows)
  }

  async fn clear_cache(&self) -> Result<StatusMessage, StoreError> {
    let reply: StatusMessage = self
      .http
      .post_empty(&[ROOT, WORKFLOW, "cache", "clear"])
      .await?;
    info!(message = %reply.message, "execution_cache_cleared");
    Ok(reply)
  }
}
