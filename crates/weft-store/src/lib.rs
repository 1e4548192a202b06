//! Weft Store
//!
//! The persistence collaborator: saved workflows and templates live on the
//! backend, and this crate is the client side of that catalog.
//!
//! The [`WorkflowStore`] trait defines operations for:
//! - Saving and server-side importing workflows
//! - Listing and fetching saved workflows
//! - Fetching the template catalog
//! - Clearing the backend's execution cache

mod http;
mod types;

pub use http::HttpStore;
pub use types::{StatusMessage, WorkflowSummary};

use async_trait::async_trait;
use weft_config::WorkflowDef;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested workflow was not found.
  #[error("workflow not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Http(#[from] weft_http::HttpError),
}

/// Catalog of saved workflows.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
  /// Create or overwrite a workflow. Returns its id.
  async fn save(&self, workflow: &WorkflowDef) -> Result<String, StoreError>;

  /// Have the backend validate a document and save it. Returns its id.
  async fn import(&self, workflow: &WorkflowDef) -> Result<String, StoreError>;

  /// Saved workflows, most recently updated first.
  async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError>;

  /// Get a workflow by id.
  async fn get(&self, workflow_id: &str) -> Result<WorkflowDef, StoreError>;

  /// The built-in example workflows.
  async fn templates(&self) -> Result<Vec<WorkflowDef>, StoreError>;

  /// Drop every cached node result on the backend.
  async fn clear_cache(&self) -> Result<StatusMessage, StoreError>;
}
