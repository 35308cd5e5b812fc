//! Area Meta-Graph
//!
//! Directed graph whose nodes are areas and whose edges are *ports*: the
//! boundary crossings the router uses to leave one area and enter another.
//!
//! # Architecture
//!
//! ```text
//! MetaGraph
//! ├── links: DiGraphMap<AreaId, Port>   # a -> b keeps the first port found
//! └── scanned: usize                     # areas [0, scanned) already linked
//! ```
//!
//! The partition only ever appends areas, so `connect` scans the areas
//! added since the previous call and leaves existing links alone.

use crate::graph::{Graph, NodeId};
use crate::partition::{AreaId, AreaPartition};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// A crossing between two areas.
///
/// The router walks to `node_from` inside the source area, reloads the
/// target area, then steps to `node_to`. When both ends are the same node
/// the crossing is a shared member and needs no step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    pub node_from: NodeId,
    pub node_to: NodeId,
}

impl Port {
    pub fn shared(node: NodeId) -> Self {
        Self {
            node_from: node,
            node_to: node,
        }
    }

    /// Whether this port is a node belonging to both areas
    pub fn is_shared(&self) -> bool {
        self.node_from == self.node_to
    }

    fn reversed(self) -> Self {
        Self {
            node_from: self.node_to,
            node_to: self.node_from,
        }
    }
}

/// Incrementally maintained area adjacency.
#[derive(Debug, Clone, Default)]
pub struct MetaGraph {
    links: DiGraphMap<AreaId, Port>,
    scanned: usize,
}

impl MetaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link every area added to `partition` since the last call.
    ///
    /// Shared-member ports are recorded before edge ports so that a pair of
    /// overlapping areas is crossed without a step. Returns the number of
    /// directed links added.
    pub fn connect(&mut self, graph: &Graph, partition: &AreaPartition) -> usize {
        let total = partition.area_count();
        if self.scanned >= total {
            return 0;
        }

        let mut added = 0;
        for area in &partition.areas()[self.scanned..] {
            let id = area.id();
            self.links.add_node(id);

            for &member in area.members() {
                for &other in partition.areas_of(member) {
                    if other != id {
                        added += self.link(id, other, Port::shared(member));
                    }
                }
            }

            for &member in area.members() {
                for neighbor in graph.neighbors(member) {
                    for &other in partition.areas_of(neighbor) {
                        if other != id {
                            let port = Port {
                                node_from: member,
                                node_to: neighbor,
                            };
                            added += self.link(id, other, port);
                        }
                    }
                }
            }
        }

        debug!(
            from = self.scanned,
            to = total,
            added,
            "meta-graph connected"
        );
        self.scanned = total;
        added
    }

    /// Record `port` for `a -> b` and its reverse for `b -> a`, keeping any
    /// port already present in either direction.
    fn link(&mut self, a: AreaId, b: AreaId, port: Port) -> usize {
        let mut added = 0;
        if !self.links.contains_edge(a, b) {
            self.links.add_edge(a, b, port);
            added += 1;
        }
        if !self.links.contains_edge(b, a) {
            self.links.add_edge(b, a, port.reversed());
            added += 1;
        }
        added
    }

    /// Number of areas linked so far
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Whether every area of `partition` has been linked
    pub fn is_synced(&self, partition: &AreaPartition) -> bool {
        self.scanned == partition.area_count()
    }

    pub fn area_count(&self) -> usize {
        self.links.node_count()
    }

    /// Number of directed links
    pub fn link_count(&self) -> usize {
        self.links.edge_count()
    }

    pub fn port(&self, from: AreaId, to: AreaId) -> Option<Port> {
        self.links.edge_weight(from, to).copied()
    }

    pub fn neighbors(&self, area: AreaId) -> impl Iterator<Item = AreaId> + '_ {
        self.links.neighbors_directed(area, Direction::Outgoing)
    }

    /// Fewest-hop sequence of areas from `from` to `to`, both included.
    pub fn area_path(&self, from: AreaId, to: AreaId) -> Option<Vec<AreaId>> {
        if !self.links.contains_node(from) || !self.links.contains_node(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: HashMap<AreaId, AreaId> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(a) = queue.pop_front() {
            for b in self.neighbors(a) {
                if b == from || parent.contains_key(&b) {
                    continue;
                }
                parent.insert(b, a);
                if b == to {
                    let mut path = vec![to];
                    let mut cur = to;
                    while let Some(&p) = parent.get(&cur) {
                        path.push(p);
                        cur = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(b);
            }
        }

        None
    }
}
