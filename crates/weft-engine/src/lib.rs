//! Weft Engine
//!
//! Drives executions on the generation backend and projects the streamed
//! progress back onto a [`weft_workflow::GraphModel`].
//!
//! # Example
//!
//! ```ignore
//! let client = ExecutionClient::new(HttpClient::new("http://localhost:8000")?);
//! let summary = client.run_partial(&mut model, "narrate").await?;
//! ```

mod batch;
mod cancel;
mod client;
mod error;
mod events;
mod projection;
pub mod sse;
mod wire;

pub use batch::run_batch;
pub use cancel::CancellationController;
pub use client::{ExecutionClient, ExecutionRequest, RunOutcome, RunSummary};
pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use projection::{Projected, Projection};
pub use wire::WireEvent;
