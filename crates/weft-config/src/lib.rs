//! Weft Config
//!
//! This crate contains the portable workflow document types for weft.
//! These are the shapes that cross the wire to the execution backend and
//! that get written to disk on export.
//!
//! Documents can come from:
//! - JSON files exported by the editor (full or lightweight)
//! - The backend's saved-workflow and template catalogs
//!
//! Nothing in here holds behavior beyond construction defaults; graph
//! mutation and execution live in `weft-workflow` and `weft-engine`.

mod edge;
mod kind;
mod node;
mod status;
mod workflow;

pub use edge::Edge;
pub use kind::{KindSpec, MediaType, NodeKind, PortSpec};
pub use node::{Node, NodeData, Position};
pub use status::NodeStatus;
pub use workflow::{GraphDocument, UNTITLED, WorkflowDef};
