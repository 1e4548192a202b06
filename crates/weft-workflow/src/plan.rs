use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which nodes a run will reset and observe.
///
/// The backend may still compute nodes outside a partial scope when they are
/// upstream dependencies; the scope only says whose state the caller watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunScope {
  /// Every node in the graph.
  All,
  /// A partial run: the start node plus everything reachable from it.
  Nodes(BTreeSet<String>),
}

impl RunScope {
  pub fn contains(&self, node_id: &str) -> bool {
    match self {
      RunScope::All => true,
      RunScope::Nodes(ids) => ids.contains(node_id),
    }
  }

  /// The `node_ids` field of an execution request: `None` means run everything.
  pub fn node_ids(&self) -> Option<Vec<String>> {
    match self {
      RunScope::All => None,
      RunScope::Nodes(ids) => Some(ids.iter().cloned().collect()),
    }
  }
}
