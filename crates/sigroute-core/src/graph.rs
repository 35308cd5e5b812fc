//! Static Road Graph
//!
//! The undirected, unweighted graph the agent walks on. Built once from an
//! edge list and never mutated afterwards.
//!
//! This module provides the `Graph` wrapper around a petgraph `UnGraphMap`
//! plus the breadth-first searches the partition and router rely on.

use petgraph::graphmap::UnGraphMap;
use std::collections::VecDeque;
use thiserror::Error;

/// Node identifier (`0..n-1`).
pub type NodeId = usize;

/// Node the agent stands on before the first move.
pub const START_NODE: NodeId = 0;

/// Errors raised while building a graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {index} references node {node}, but the graph has {node_count} nodes")]
    NodeOutOfRange {
        index: usize,
        node: NodeId,
        node_count: usize,
    },
}

/// Undirected adjacency structure over node ids `0..n-1`.
///
/// Duplicate edges collapse into one (set semantics of `GraphMap`).
#[derive(Debug, Clone)]
pub struct Graph {
    inner: UnGraphMap<NodeId, ()>,
    node_count: usize,
}

impl Graph {
    /// Build a graph with `node_count` nodes from an edge list.
    pub fn from_edges(node_count: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, GraphError> {
        let mut inner = UnGraphMap::with_capacity(node_count, edges.len());
        for node in 0..node_count {
            inner.add_node(node);
        }

        for (index, &(u, v)) in edges.iter().enumerate() {
            for node in [u, v] {
                if node >= node_count {
                    return Err(GraphError::NodeOutOfRange {
                        index,
                        node,
                        node_count,
                    });
                }
            }
            inner.add_edge(u, v, ());
        }

        Ok(Self { inner, node_count })
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over the neighbors of `node`
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.inner.neighbors(node)
    }

    /// Number of neighbors of `node`
    pub fn degree(&self, node: NodeId) -> usize {
        self.inner.neighbors(node).count()
    }

    /// Whether `u` and `v` share an edge
    pub fn is_adjacent(&self, u: NodeId, v: NodeId) -> bool {
        self.inner.contains_edge(u, v)
    }

    /// Shortest path from `from` to `to`, both endpoints included.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        self.shortest_path_within(from, to, |_| true)
    }

    /// Shortest path from `from` to `to` visiting only nodes accepted by `allowed`.
    ///
    /// Both endpoints must satisfy `allowed`; otherwise `None` is returned.
    pub fn shortest_path_within<F>(&self, from: NodeId, to: NodeId, allowed: F) -> Option<Vec<NodeId>>
    where
        F: Fn(NodeId) -> bool,
    {
        if from >= self.node_count || to >= self.node_count {
            return None;
        }
        if !allowed(from) || !allowed(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: Vec<Option<NodeId>> = vec![None; self.node_count];
        let mut seen = vec![false; self.node_count];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back(from);

        while let Some(u) = queue.pop_front() {
            for v in self.inner.neighbors(u) {
                if seen[v] || !allowed(v) {
                    continue;
                }
                seen[v] = true;
                parent[v] = Some(u);
                if v == to {
                    return Some(unwind(&parent, from, to));
                }
                queue.push_back(v);
            }
        }

        None
    }
}

/// Rebuild the `from -> to` path from a BFS parent table.
fn unwind(parent: &[Option<NodeId>], from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        match parent[cur] {
            Some(p) => {
                path.push(p);
                cur = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
