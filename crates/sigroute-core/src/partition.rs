//! Area Partition
//!
//! The mutable model at the heart of the solver: an append-only arena of
//! areas (bounded-size node groups), each owning a contiguous slice of the
//! shared directory, plus the `node -> areas` membership index.
//!
//! # Design
//!
//! ```text
//! AreaPartition
//! ├── areas: Vec<Arc<Area>>          # arena, AreaId = index, immutable once pushed
//! ├── membership: Vec<Vec<AreaId>>   # node -> every area holding it
//! ├── directory: Vec<NodeId>         # concatenated members, append-only
//! └── generation: u64                # bumped once per mutating operation
//! ```
//!
//! Areas are shared through `Arc`, so cloning a partition for the search
//! loop copies only the indices and the directory.

use crate::graph::{Graph, NodeId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Value written into unused trailing directory slots
pub const SENTINEL_NODE: NodeId = 0;

/// Default number of nodes shared by consecutive chunks of a long path
pub const DEFAULT_CHUNK_OVERLAP: usize = 1;

/// Identifier of an area (index into the partition's arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AreaId(pub usize);

impl AreaId {
    /// Position in the area arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area#{}", self.0)
    }
}

/// A bounded group of nodes occupying `offset..offset + len` of the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    id: AreaId,
    offset: usize,
    members: Vec<NodeId>,
}

impl Area {
    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Directory offset of the first member
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Directory slots occupied by this area
    pub fn directory_range(&self) -> Range<usize> {
        self.offset..self.offset + self.members.len()
    }
}

/// Order in which the cover pass picks its seed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverOrder {
    /// Random order (avoids pathological area shapes)
    #[default]
    Shuffled,
    /// Ascending node id, for reproducible layouts
    Ascending,
}

/// Constraints applied by [`AreaPartition::tie`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TieOptions {
    /// Allow path nodes that already belong to an area
    pub allow_overwrite: bool,
    /// Require every chunk to hold exactly `capacity_b` nodes
    pub require_exact_fit: bool,
    /// Keep enough free slots for the cover pass to still cover every node
    pub reserve_for_cover: bool,
}

/// Expected, non-fatal reasons for a `tie` to leave the partition untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TieRejection {
    #[error("pair ({from}, {to}) was already tied")]
    Duplicate { from: NodeId, to: NodeId },

    #[error("no path between {from} and {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("node {node} already belongs to an area")]
    AlreadyCovered { node: NodeId },

    #[error("path of {path_len} nodes does not split into full chunks of {capacity}")]
    NotExactFit { path_len: usize, capacity: usize },

    #[error("tie needs {needed} directory slots but only {available} are available")]
    InsufficientCapacity { needed: usize, available: usize },
}

/// Errors raised while building the partition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("directory exhausted: {uncovered} nodes still uncovered (capacity {capacity})")]
    DirectoryExhausted { uncovered: usize, capacity: usize },
}

/// Summary figures for a partition
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub node_count: usize,
    pub covered_nodes: usize,
    pub area_count: usize,
    pub directory_used: usize,
    pub directory_capacity: usize,
    pub max_membership: usize,
    pub generation: u64,
}

/// Append-only collection of areas laid out in a fixed-capacity directory.
#[derive(Debug, Clone)]
pub struct AreaPartition {
    capacity_a: usize,
    capacity_b: usize,
    chunk_overlap: usize,
    areas: Vec<Arc<Area>>,
    membership: Vec<Vec<AreaId>>,
    directory: Vec<NodeId>,
    uncovered: usize,
    tied: HashSet<(NodeId, NodeId)>,
    generation: u64,
}

impl AreaPartition {
    /// Create an empty partition for `node_count` nodes.
    ///
    /// `capacity_a` is the directory length, `capacity_b` the buffer length
    /// (the maximum area size).
    pub fn new(node_count: usize, capacity_a: usize, capacity_b: usize) -> Self {
        let capacity_b = capacity_b.max(1);
        Self {
            capacity_a,
            capacity_b,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP.min(capacity_b - 1),
            areas: Vec::new(),
            membership: vec![Vec::new(); node_count],
            directory: Vec::with_capacity(capacity_a),
            uncovered: node_count,
            tied: HashSet::new(),
            generation: 0,
        }
    }

    /// Set the number of nodes shared by consecutive chunks of a split path.
    ///
    /// Clamped below `capacity_b` so chunking always makes progress.
    pub fn with_chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap.min(self.capacity_b - 1);
        self
    }

    pub fn capacity_a(&self) -> usize {
        self.capacity_a
    }

    pub fn capacity_b(&self) -> usize {
        self.capacity_b
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Mutation counter used to invalidate cached paths
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node_count(&self) -> usize {
        self.membership.len()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn areas(&self) -> &[Arc<Area>] {
        &self.areas
    }

    /// Look up an area. Panics on an id this partition never issued.
    pub fn area(&self, id: AreaId) -> &Area {
        &self.areas[id.0]
    }

    pub fn get_area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.0).map(|a| a.as_ref())
    }

    /// Every area holding `node`, in creation order
    pub fn areas_of(&self, node: NodeId) -> &[AreaId] {
        self.membership.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_covered(&self, node: NodeId) -> bool {
        !self.areas_of(node).is_empty()
    }

    /// Nodes that do not belong to any area yet
    pub fn uncovered_count(&self) -> usize {
        self.uncovered
    }

    pub fn directory_used(&self) -> usize {
        self.directory.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity_a.saturating_sub(self.directory.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    /// Directory contents padded to `capacity_a` with [`SENTINEL_NODE`].
    pub fn directory(&self) -> Vec<NodeId> {
        let mut out = self.directory.clone();
        out.resize(self.capacity_a, SENTINEL_NODE);
        out
    }

    pub fn stats(&self) -> PartitionStats {
        PartitionStats {
            node_count: self.node_count(),
            covered_nodes: self.node_count() - self.uncovered,
            area_count: self.areas.len(),
            directory_used: self.directory.len(),
            directory_capacity: self.capacity_a,
            max_membership: self.membership.iter().map(Vec::len).max().unwrap_or(0),
            generation: self.generation,
        }
    }

    /// Cover every node that has no area yet.
    ///
    /// Each uncovered seed grows a new area by BFS over uncovered nodes until
    /// the area holds `capacity_b` nodes or runs out of uncovered neighbors.
    /// Returns the number of areas created; a fully covered partition is
    /// left untouched.
    pub fn cover_remaining<R: Rng + ?Sized>(
        &mut self,
        graph: &Graph,
        order: CoverOrder,
        rng: &mut R,
    ) -> Result<usize, PartitionError> {
        if self.uncovered == 0 {
            return Ok(0);
        }

        let mut seeds: Vec<NodeId> = (0..self.node_count()).collect();
        if order == CoverOrder::Shuffled {
            seeds.shuffle(rng);
        }

        let mut created = 0;
        for seed in seeds {
            if self.is_covered(seed) {
                continue;
            }

            let limit = self.capacity_b.min(self.remaining_capacity());
            if limit == 0 {
                return Err(PartitionError::DirectoryExhausted {
                    uncovered: self.uncovered,
                    capacity: self.capacity_a,
                });
            }

            let members = self.grow_uncovered(graph, seed, limit);
            let id = self.push_area(members);
            trace!(area = %id, seed, "cover area created");
            created += 1;
        }

        if created > 0 {
            self.generation += 1;
            debug!(
                created,
                used = self.directory.len(),
                capacity = self.capacity_a,
                "cover pass complete"
            );
        }

        Ok(created)
    }

    /// BFS from `seed` over uncovered nodes, collecting at most `limit` nodes.
    fn grow_uncovered(&self, graph: &Graph, seed: NodeId, limit: usize) -> Vec<NodeId> {
        let mut members = vec![seed];
        let mut seen = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);

        while let Some(u) = queue.pop_front() {
            for v in graph.neighbors(u) {
                if members.len() >= limit {
                    return members;
                }
                if self.is_covered(v) || !seen.insert(v) {
                    continue;
                }
                members.push(v);
                queue.push_back(v);
            }
        }

        members
    }

    /// Create areas covering the shortest path between `from` and `to`.
    ///
    /// The path is split into chunks of at most `capacity_b` nodes sharing
    /// `chunk_overlap` nodes at each seam. Returns the number of directory
    /// slots used; a rejection leaves the partition and its generation
    /// untouched.
    pub fn tie(
        &mut self,
        graph: &Graph,
        from: NodeId,
        to: NodeId,
        options: TieOptions,
    ) -> Result<usize, TieRejection> {
        if self.tied.contains(&(from, to)) {
            return Err(TieRejection::Duplicate { from, to });
        }

        let path = graph
            .shortest_path(from, to)
            .ok_or(TieRejection::NoPath { from, to })?;

        if !options.allow_overwrite {
            if let Some(&node) = path.iter().find(|&&n| self.is_covered(n)) {
                return Err(TieRejection::AlreadyCovered { node });
            }
        }

        let chunks = chunk_ranges(path.len(), self.capacity_b, self.chunk_overlap);
        if options.require_exact_fit && chunks.iter().any(|r| r.len() != self.capacity_b) {
            return Err(TieRejection::NotExactFit {
                path_len: path.len(),
                capacity: self.capacity_b,
            });
        }

        let needed: usize = chunks.iter().map(|r| r.len()).sum();
        let mut available = self.remaining_capacity();
        if options.reserve_for_cover {
            let newly_covered = path.iter().filter(|&&n| !self.is_covered(n)).count();
            available = available.saturating_sub(self.uncovered - newly_covered);
        }
        if needed > available {
            return Err(TieRejection::InsufficientCapacity { needed, available });
        }

        for range in chunks {
            self.push_area(path[range].to_vec());
        }
        self.tied.insert((from, to));
        self.generation += 1;

        trace!(from, to, needed, "tied path");
        Ok(needed)
    }

    /// Append chunked areas along `path`, truncated to the free directory space.
    ///
    /// Returns the ids of the areas created. The generation is bumped only
    /// when at least one area was added.
    pub fn append_path(&mut self, path: &[NodeId]) -> Vec<AreaId> {
        let mut remaining = self.remaining_capacity();
        let mut created = Vec::new();

        for range in chunk_ranges(path.len(), self.capacity_b, self.chunk_overlap) {
            if remaining == 0 {
                break;
            }
            let take = range.len().min(remaining);
            let members = path[range.start..range.start + take].to_vec();
            remaining -= take;
            created.push(self.push_area(members));
        }

        if !created.is_empty() {
            self.generation += 1;
        }
        created
    }

    /// Push one area at the next free directory offset (no generation bump).
    fn push_area(&mut self, members: Vec<NodeId>) -> AreaId {
        let id = AreaId(self.areas.len());
        let offset = self.directory.len();

        for &node in &members {
            let slots = &mut self.membership[node];
            if slots.is_empty() {
                self.uncovered -= 1;
            }
            slots.push(id);
        }
        self.directory.extend_from_slice(&members);
        self.areas.push(Arc::new(Area {
            id,
            offset,
            members,
        }));
        id
    }
}

/// Split `0..len` into windows of at most `capacity` with `overlap` shared
/// positions between consecutive windows.
pub(crate) fn chunk_ranges(len: usize, capacity: usize, overlap: usize) -> Vec<Range<usize>> {
    if len == 0 || capacity == 0 {
        return Vec::new();
    }
    let stride = capacity - overlap.min(capacity - 1);

    let mut out = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + capacity).min(len);
        out.push(start..end);
        if end == len {
            break;
        }
        start += stride;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn path_graph(n: usize) -> Graph {
        let edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
        Graph::from_edges(n, &edges).unwrap()
    }

    fn grid_graph(w: usize, h: usize) -> Graph {
        let mut edges = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let id = y * w + x;
                if x + 1 < w {
                    edges.push((id, id + 1));
                }
                if y + 1 < h {
                    edges.push((id, id + w));
                }
            }
        }
        Graph::from_edges(w * h, &edges).unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(0, 3, 1), Vec::<Range<usize>>::new());
        assert_eq!(chunk_ranges(3, 3, 1), vec![0..3]);
        assert_eq!(chunk_ranges(5, 3, 1), vec![0..3, 2..5]);
        assert_eq!(chunk_ranges(7, 3, 0), vec![0..3, 3..6, 6..7]);
        // overlap clamped so the stride stays positive
        assert_eq!(chunk_ranges(4, 2, 5), vec![0..2, 1..3, 2..4]);
    }

    #[test]
    fn test_cover_ascending_on_path() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 6, 3);

        let created = partition
            .cover_remaining(&graph, CoverOrder::Ascending, &mut rng())
            .unwrap();

        assert_eq!(created, 2);
        assert_eq!(partition.area(AreaId(0)).members(), &[0, 1, 2]);
        assert_eq!(partition.area(AreaId(0)).offset(), 0);
        assert_eq!(partition.area(AreaId(1)).members(), &[3, 4]);
        assert_eq!(partition.area(AreaId(1)).offset(), 3);
        assert_eq!(partition.directory(), vec![0, 1, 2, 3, 4, 0]);
        assert_eq!(partition.generation(), 1);
    }

    #[test]
    fn test_cover_is_idempotent() {
        let graph = grid_graph(4, 4);
        let mut partition = AreaPartition::new(16, 32, 4);
        partition
            .cover_remaining(&graph, CoverOrder::Shuffled, &mut rng())
            .unwrap();
        let generation = partition.generation();
        let areas = partition.area_count();

        let created = partition
            .cover_remaining(&graph, CoverOrder::Shuffled, &mut rng())
            .unwrap();
        assert_eq!(created, 0);
        assert_eq!(partition.generation(), generation);
        assert_eq!(partition.area_count(), areas);
    }

    #[test]
    fn test_cover_shuffled_covers_everything_within_bounds() {
        let graph = grid_graph(6, 5);
        let mut partition = AreaPartition::new(30, 60, 4);
        partition
            .cover_remaining(&graph, CoverOrder::Shuffled, &mut rng())
            .unwrap();

        assert_eq!(partition.uncovered_count(), 0);
        for node in 0..30 {
            assert!(partition.is_covered(node), "node {} uncovered", node);
        }
        for area in partition.areas() {
            assert!(area.len() <= 4);
            assert!(!area.is_empty());
        }
        let total: usize = partition.areas().iter().map(|a| a.len()).sum();
        assert_eq!(total, partition.directory_used());
        assert!(total <= 60);
    }

    #[test]
    fn test_cover_fails_when_directory_too_small() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 4, 2);
        let err = partition
            .cover_remaining(&graph, CoverOrder::Ascending, &mut rng())
            .unwrap_err();
        assert_eq!(
            err,
            PartitionError::DirectoryExhausted {
                uncovered: 1,
                capacity: 4
            }
        );
    }

    #[test]
    fn test_cover_trims_last_area_to_free_space() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 5, 3);
        partition.tie(&graph, 0, 0, TieOptions::default()).unwrap();
        // 4 free slots, 4 uncovered nodes: areas [1,2,3] and [4]
        partition
            .cover_remaining(&graph, CoverOrder::Ascending, &mut rng())
            .unwrap();
        assert!(partition.is_full());
        assert_eq!(partition.uncovered_count(), 0);
    }

    #[test]
    fn test_tie_exact_fit_rejects_short_path() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 10, 3);
        let options = TieOptions {
            require_exact_fit: true,
            ..Default::default()
        };

        let err = partition.tie(&graph, 0, 1, options).unwrap_err();
        assert_eq!(
            err,
            TieRejection::NotExactFit {
                path_len: 2,
                capacity: 3
            }
        );
        assert_eq!(partition.generation(), 0);
        assert_eq!(partition.area_count(), 0);

        // a path of exactly capacity_b nodes fits
        assert_eq!(partition.tie(&graph, 0, 2, options), Ok(3));
        assert_eq!(partition.generation(), 1);
    }

    #[test]
    fn test_tie_duplicate_pair_rejected() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 20, 3);
        let options = TieOptions {
            allow_overwrite: true,
            ..Default::default()
        };

        assert!(partition.tie(&graph, 1, 3, options).is_ok());
        let generation = partition.generation();
        assert_eq!(
            partition.tie(&graph, 1, 3, options),
            Err(TieRejection::Duplicate { from: 1, to: 3 })
        );
        assert_eq!(partition.generation(), generation);
        // the reverse pair is a different request
        assert!(partition.tie(&graph, 3, 1, options).is_ok());
    }

    #[test]
    fn test_tie_respects_overwrite_flag() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 20, 3);
        partition.tie(&graph, 0, 2, TieOptions::default()).unwrap();

        assert_eq!(
            partition.tie(&graph, 2, 4, TieOptions::default()),
            Err(TieRejection::AlreadyCovered { node: 2 })
        );
        let allow = TieOptions {
            allow_overwrite: true,
            ..Default::default()
        };
        assert_eq!(partition.tie(&graph, 2, 4, allow), Ok(3));
        assert_eq!(partition.areas_of(2), &[AreaId(0), AreaId(1)]);
    }

    #[test]
    fn test_tie_capacity_and_reserve() {
        let graph = path_graph(6);
        let mut partition = AreaPartition::new(6, 7, 3);

        // 6 nodes, 7 slots: tying 0..=2 leaves 4 slots for 3 uncovered nodes
        let reserve = TieOptions {
            reserve_for_cover: true,
            ..Default::default()
        };
        assert_eq!(partition.tie(&graph, 0, 2, reserve), Ok(3));

        // 3..=5 with overlap=1 on a 3-wide buffer fits exactly in one chunk
        assert_eq!(partition.tie(&graph, 3, 5, reserve), Ok(3));

        let allow = TieOptions {
            allow_overwrite: true,
            ..Default::default()
        };
        assert_eq!(
            partition.tie(&graph, 0, 5, allow),
            Err(TieRejection::InsufficientCapacity {
                needed: 8,
                available: 1
            })
        );
    }

    #[test]
    fn test_tie_reserve_protects_cover() {
        let graph = path_graph(6);
        let mut partition = AreaPartition::new(6, 6, 3);
        let options = TieOptions {
            allow_overwrite: true,
            reserve_for_cover: true,
            ..Default::default()
        };
        partition.tie(&graph, 0, 2, options).unwrap();
        // re-tying covered nodes would steal the slots the cover still needs
        assert_eq!(
            partition.tie(&graph, 2, 0, options),
            Err(TieRejection::InsufficientCapacity {
                needed: 3,
                available: 0
            })
        );
    }

    #[test]
    fn test_long_tie_chunks_with_overlap() {
        let graph = path_graph(8);
        let mut partition = AreaPartition::new(8, 20, 3).with_chunk_overlap(1);
        let used = partition.tie(&graph, 0, 6, TieOptions::default()).unwrap();

        // 7 nodes, windows 0..3, 2..5, 4..7
        assert_eq!(used, 9);
        assert_eq!(partition.area_count(), 3);
        assert_eq!(partition.area(AreaId(1)).members(), &[2, 3, 4]);
        assert_eq!(partition.areas_of(2), &[AreaId(0), AreaId(1)]);
        assert_eq!(partition.generation(), 1);
    }

    #[test]
    fn test_append_path_truncates_to_capacity() {
        let mut partition = AreaPartition::new(8, 4, 3).with_chunk_overlap(0);
        let created = partition.append_path(&[0, 1, 2, 3, 4, 5]);

        assert_eq!(created, vec![AreaId(0), AreaId(1)]);
        assert_eq!(partition.area(AreaId(1)).members(), &[3]);
        assert!(partition.is_full());
        assert_eq!(partition.generation(), 1);

        assert!(partition.append_path(&[6, 7]).is_empty());
        assert_eq!(partition.generation(), 1);
    }

    #[test]
    fn test_stats() {
        let graph = path_graph(5);
        let mut partition = AreaPartition::new(5, 10, 3);
        partition
            .cover_remaining(&graph, CoverOrder::Ascending, &mut rng())
            .unwrap();
        partition
            .tie(
                &graph,
                1,
                3,
                TieOptions {
                    allow_overwrite: true,
                    ..Default::default()
                },
            )
            .unwrap();

        let stats = partition.stats();
        assert_eq!(stats.area_count, 3);
        assert_eq!(stats.covered_nodes, 5);
        assert_eq!(stats.directory_used, 8);
        assert_eq!(stats.max_membership, 2);
        assert_eq!(stats.generation, 2);
    }
}
