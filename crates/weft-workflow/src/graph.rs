use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use weft_config::{Edge, Node};

/// Adjacency view over a node/edge snapshot, used for traversal.
///
/// Edges whose source or target is not among the nodes are treated as
/// absent.
#[derive(Debug, Clone)]
pub struct Graph {
  /// node_id -> downstream node_ids, in edge order.
  adjacency: HashMap<String, Vec<String>>,
  /// Edges dropped because an endpoint was missing.
  dangling: usize,
}

impl Graph {
  /// Build a graph from nodes and edges.
  pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for node in nodes {
      adjacency.entry(node.id.clone()).or_default();
    }

    let mut dangling = 0;
    for edge in edges {
      if !adjacency.contains_key(&edge.source) || !adjacency.contains_key(&edge.target) {
        dangling += 1;
        continue;
      }
      adjacency
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
    }

    Self {
      adjacency,
      dangling,
    }
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Number of edges ignored because they reference a missing node.
  pub fn dangling_edges(&self) -> usize {
    self.dangling
  }

  /// Every node reachable from `start` along source -> target edges,
  /// including `start` itself.
  ///
  /// Breadth-first; each node is enqueued at most once, so cycles terminate.
  /// `start` is always present in the result even if it is not in the graph.
  pub fn downstream_set(&self, start: &str) -> BTreeSet<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut result = BTreeSet::new();

    visited.insert(start);
    queue.push_back(start);
    result.insert(start.to_string());

    while let Some(current) = queue.pop_front() {
      for next in self.downstream(current) {
        if visited.insert(next.as_str()) {
          result.insert(next.clone());
          queue.push_back(next.as_str());
        }
      }
    }

    result
  }
}
