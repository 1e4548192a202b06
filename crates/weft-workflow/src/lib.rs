//! Weft Workflow
//!
//! This crate holds the in-memory graph the editor works on.
//!
//! It covers:
//! - Mutation (`GraphModel`), driven by `GraphIntent` messages
//! - Partial-run planning: which nodes re-run when one node is re-triggered
//! - The per-node status state machine
//! - Portable export/import documents
//!
//! Nothing in here performs I/O. Execution against the backend lives in
//! `weft-engine`.

pub mod codec;
mod error;
mod graph;
mod intent;
mod model;
mod plan;
mod state;

pub use codec::{ExportOptions, ImportedDocument};
pub use error::{CodecError, TransitionError, WorkflowError};
pub use graph::Graph;
pub use intent::GraphIntent;
pub use model::{GraphModel, PortViolation};
pub use plan::RunScope;
pub use state::{Transition, is_allowed};
