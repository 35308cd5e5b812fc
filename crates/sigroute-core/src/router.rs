//! Reload-Minimizing Router
//!
//! Turns "go to node `dest`" into a sequence of reloads and steps.
//!
//! For every pair of (area holding the current node, area holding the
//! destination) the router looks up the area-to-area route and walks it:
//!
//! ```text
//! [reload A0] steps in A0 -> port.node_from
//!             [reload A1] step -> port.node_to   (skipped for shared ports)
//!             steps in A1 -> ...
//!                                  ... steps in Ak -> dest
//! ```
//!
//! The cheapest walk wins: fewest reloads, then fewest operations, then
//! the first one found. Every reload copies a whole area to buffer offset
//! 0 before any step into it, so each step lands on a node in the buffer.

use crate::cache::PathCache;
use crate::graph::{Graph, NodeId, START_NODE};
use crate::meta::MetaGraph;
use crate::operation::Operation;
use crate::partition::{AreaId, AreaPartition};
use thiserror::Error;

/// Routing failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("node {node} is not a member of {area}")]
    NotInArea { area: AreaId, node: NodeId },

    #[error("{area} has no internal path from {from} to {to}")]
    AreaDisconnected {
        area: AreaId,
        from: NodeId,
        to: NodeId,
    },

    #[error("no port recorded from {from} to {to}")]
    MissingPort { from: AreaId, to: AreaId },

    #[error("no area route from node {from} to node {to}")]
    Unreachable { from: NodeId, to: NodeId },
}

impl RouteError {
    /// Whether the error means the partition and its derived structures
    /// disagree, as opposed to the destination simply being out of reach.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, RouteError::Unreachable { .. })
    }
}

/// Where the agent stands and which area the buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    pub current: NodeId,
    pub signed: Option<AreaId>,
}

impl Agent {
    pub fn new(current: NodeId) -> Self {
        Self {
            current,
            signed: None,
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(START_NODE)
    }
}

/// Whether a move is appended to the log or only priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveMode {
    #[default]
    Commit,
    Simulate,
}

/// Operations for one move and the agent state after them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub ops: Vec<Operation>,
    pub reloads: usize,
    pub agent: Agent,
}

impl MovePlan {
    fn stay(agent: Agent) -> Self {
        Self {
            ops: Vec::new(),
            reloads: 0,
            agent,
        }
    }

    fn cost(&self) -> (usize, usize) {
        (self.reloads, self.ops.len())
    }

    /// Nodes stepped on, in order
    pub fn steps(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Operation::Step(node) => Some(*node),
            Operation::Reload { .. } => None,
        })
    }
}

/// Borrowed view over a field's routing state.
pub struct Router<'a> {
    graph: &'a Graph,
    partition: &'a AreaPartition,
    meta: &'a MetaGraph,
    cache: &'a mut PathCache,
}

impl<'a> Router<'a> {
    /// `meta` must already be connected to every area of `partition`.
    pub fn new(
        graph: &'a Graph,
        partition: &'a AreaPartition,
        meta: &'a MetaGraph,
        cache: &'a mut PathCache,
    ) -> Self {
        Self {
            graph,
            partition,
            meta,
            cache,
        }
    }

    /// Cheapest plan moving `agent` to `dest`.
    pub fn plan(&mut self, agent: &Agent, dest: NodeId) -> Result<MovePlan, RouteError> {
        if dest == agent.current {
            return Ok(MovePlan::stay(*agent));
        }

        let unreachable = RouteError::Unreachable {
            from: agent.current,
            to: dest,
        };
        let partition = self.partition;
        let generation = partition.generation();
        let mut best: Option<MovePlan> = None;

        for &start in partition.areas_of(agent.current) {
            for &goal in partition.areas_of(dest) {
                let Some(route) = self.cache.area_path(self.meta, generation, start, goal) else {
                    continue;
                };
                let plan = self.walk(agent, &route, dest)?;
                if best.as_ref().map_or(true, |b| plan.cost() < b.cost()) {
                    best = Some(plan);
                }
            }
        }

        best.ok_or(unreachable)
    }

    fn walk(&mut self, agent: &Agent, route: &[AreaId], dest: NodeId) -> Result<MovePlan, RouteError> {
        let mut plan = MovePlan::stay(*agent);
        let Some((&last, _)) = route.split_last() else {
            return Err(RouteError::Unreachable {
                from: agent.current,
                to: dest,
            });
        };

        self.sign(&mut plan, route[0]);
        for pair in route.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let port = self
                .meta
                .port(from, to)
                .ok_or(RouteError::MissingPort { from, to })?;

            self.walk_inside(&mut plan, from, port.node_from)?;
            self.sign(&mut plan, to);
            if !port.is_shared() {
                plan.ops.push(Operation::Step(port.node_to));
                plan.agent.current = port.node_to;
            }
        }
        self.walk_inside(&mut plan, last, dest)?;

        Ok(plan)
    }

    fn sign(&self, plan: &mut MovePlan, area: AreaId) {
        if plan.agent.signed == Some(area) {
            return;
        }
        let a = self.partition.area(area);
        plan.ops.push(Operation::Reload {
            len: a.len(),
            directory_offset: a.offset(),
            buffer_offset: 0,
        });
        plan.reloads += 1;
        plan.agent.signed = Some(area);
    }

    fn walk_inside(&mut self, plan: &mut MovePlan, area: AreaId, to: NodeId) -> Result<(), RouteError> {
        let from = plan.agent.current;
        let members = self.partition.area(area);
        for node in [from, to] {
            if !members.contains(node) {
                return Err(RouteError::NotInArea { area, node });
            }
        }

        let path = self
            .cache
            .in_area_path(self.graph, self.partition, area, from, to)
            .ok_or(RouteError::AreaDisconnected { area, from, to })?;
        plan.ops
            .extend(path.iter().skip(1).map(|&v| Operation::Step(v)));
        plan.agent.current = to;
        Ok(())
    }
}
