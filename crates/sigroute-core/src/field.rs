//! Routing Field
//!
//! Bundles everything a candidate solution consists of so the search loop
//! can clone it as one value:
//!
//! ```text
//! Field
//! ├── graph: Arc<Graph>          # shared, never mutated
//! ├── partition: AreaPartition   # areas (Arc-shared) + membership + directory
//! ├── meta: MetaGraph            # lazily synced to the partition
//! ├── cache: PathCache           # generation-stamped BFS results
//! ├── agent: Agent               # committed position and buffer state
//! └── log: OperationLog          # committed operations
//! ```

use crate::cache::PathCache;
use crate::deadline::Deadline;
use crate::graph::{Graph, NodeId};
use crate::meta::MetaGraph;
use crate::operation::OperationLog;
use crate::partition::{AreaPartition, CoverOrder, PartitionError, TieOptions, TieRejection};
use crate::router::{Agent, MovePlan, MoveMode, RouteError, Router};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Result of a successful [`Field::augment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentOutcome {
    pub from: NodeId,
    pub to: NodeId,
    /// Area hops between the sampled endpoints before the shortcut
    pub meta_distance: usize,
    pub areas_added: usize,
    pub slots_used: usize,
}

#[derive(Debug, Clone)]
pub struct Field {
    graph: Arc<Graph>,
    partition: AreaPartition,
    meta: MetaGraph,
    cache: PathCache,
    agent: Agent,
    log: OperationLog,
}

impl Field {
    pub fn new(graph: Arc<Graph>, capacity_a: usize, capacity_b: usize) -> Self {
        let partition = AreaPartition::new(graph.node_count(), capacity_a, capacity_b);
        Self {
            graph,
            partition,
            meta: MetaGraph::new(),
            cache: PathCache::new(),
            agent: Agent::default(),
            log: OperationLog::new(),
        }
    }

    /// Set the chunk overlap used by `tie` and `augment`.
    pub fn with_chunk_overlap(mut self, overlap: usize) -> Self {
        self.partition = self.partition.with_chunk_overlap(overlap);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn partition(&self) -> &AreaPartition {
        &self.partition
    }

    pub fn meta(&self) -> &MetaGraph {
        &self.meta
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Link areas added since the last sync into the meta-graph.
    pub fn sync(&mut self) -> usize {
        self.meta.connect(&self.graph, &self.partition)
    }

    pub fn cover_remaining<R: Rng + ?Sized>(
        &mut self,
        order: CoverOrder,
        rng: &mut R,
    ) -> Result<usize, PartitionError> {
        self.partition.cover_remaining(&self.graph, order, rng)
    }

    pub fn tie(&mut self, from: NodeId, to: NodeId, options: TieOptions) -> Result<usize, TieRejection> {
        self.partition.tie(&self.graph, from, to, options)
    }

    /// Add a shortcut for the worst-connected of `sample_size` random hops
    /// of `route`.
    ///
    /// Each sample picks consecutive nodes `a, b` of `route` and one random
    /// area membership for each. The pair whose areas lie furthest apart on
    /// the meta-graph (more than one hop) gets new areas along the node
    /// shortest path `a -> b`, minus the leading nodes already in the source
    /// area and the trailing nodes already in the target area. Returns
    /// `None` when nothing was added.
    pub fn augment<R: Rng + ?Sized>(
        &mut self,
        route: &[NodeId],
        sample_size: usize,
        rng: &mut R,
    ) -> Option<AugmentOutcome> {
        if self.partition.is_full() || route.len() < 2 {
            return None;
        }
        self.sync();
        let generation = self.partition.generation();

        let mut best: Option<(usize, NodeId, NodeId, _, _)> = None;
        for _ in 0..sample_size {
            let i = rng.gen_range(0..route.len() - 1);
            let (a, b) = (route[i], route[i + 1]);
            if a == b {
                continue;
            }
            let (Some(&sa), Some(&sb)) = (
                self.partition.areas_of(a).choose(rng),
                self.partition.areas_of(b).choose(rng),
            ) else {
                continue;
            };
            let Some(path) = self.cache.area_path(&self.meta, generation, sa, sb) else {
                continue;
            };
            let distance = path.len() - 1;
            if best.map_or(true, |(d, ..)| distance > d) {
                best = Some((distance, a, b, sa, sb));
            }
        }

        let (distance, from, to, sa, sb) = best?;
        if distance <= 1 {
            return None;
        }

        let path = self.graph.shortest_path(from, to)?;
        let source = self.partition.area(sa);
        let target = self.partition.area(sb);
        let start = path.iter().take_while(|&&v| source.contains(v)).count();
        let end = path.len() - path.iter().rev().take_while(|&&v| target.contains(v)).count();
        if start >= end {
            return None;
        }

        let added = self.partition.append_path(&path[start..end]);
        if added.is_empty() {
            return None;
        }
        let slots_used = added.iter().map(|&id| self.partition.area(id).len()).sum();

        debug!(
            from,
            to,
            distance,
            areas = added.len(),
            slots_used,
            remaining = self.partition.remaining_capacity(),
            "augmented partition"
        );
        Some(AugmentOutcome {
            from,
            to,
            meta_distance: distance,
            areas_added: added.len(),
            slots_used,
        })
    }

    /// Plan a move of the committed agent to `dest`.
    ///
    /// In [`MoveMode::Commit`] the plan is appended to the log and the agent
    /// advances; in [`MoveMode::Simulate`] nothing changes.
    pub fn move_to(&mut self, dest: NodeId, mode: MoveMode) -> Result<MovePlan, RouteError> {
        self.sync();
        let mut router = Router::new(&self.graph, &self.partition, &self.meta, &mut self.cache);
        let plan = router.plan(&self.agent, dest)?;

        if mode == MoveMode::Commit {
            self.log.extend(plan.ops.iter().copied());
            self.agent = plan.agent;
        }
        Ok(plan)
    }

    /// Commit moves to every node of `order` in sequence. Returns the
    /// reloads added to the log.
    pub fn play(&mut self, order: &[NodeId]) -> Result<usize, RouteError> {
        let before = self.log.reloads();
        for &dest in order {
            self.move_to(dest, MoveMode::Commit)?;
        }
        Ok(self.log.reloads() - before)
    }

    /// Reload cost of visiting `order` from the start node, leaving the
    /// committed agent and log untouched.
    ///
    /// Returns `Ok(None)` when `deadline` passes before the walk finishes.
    pub fn evaluate(&mut self, order: &[NodeId], deadline: &Deadline) -> Result<Option<usize>, RouteError> {
        self.sync();
        let mut router = Router::new(&self.graph, &self.partition, &self.meta, &mut self.cache);
        let mut agent = Agent::default();
        let mut reloads = 0;

        for &dest in order {
            if deadline.expired() {
                return Ok(None);
            }
            let plan = router.plan(&agent, dest)?;
            reloads += plan.reloads;
            agent = plan.agent;
        }
        Ok(Some(reloads))
    }

    /// Return the agent to the start node with an empty buffer and log.
    pub fn reset_agent(&mut self) {
        self.agent = Agent::default();
        self.log.clear();
    }

    /// Directory padded to its full capacity
    pub fn directory(&self) -> Vec<NodeId> {
        self.partition.directory()
    }
}
