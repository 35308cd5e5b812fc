//! Generation-Stamped Path Cache
//!
//! Memoizes the two BFS queries the router issues over and over: paths
//! inside a single area and area-to-area routes on the meta-graph.
//!
//! Every entry carries the partition generation it was computed at. An
//! entry whose stamp differs from the current generation is stale; it is
//! recomputed on access and overwritten in place. Nothing is swept.

use crate::graph::{Graph, NodeId};
use crate::meta::MetaGraph;
use crate::partition::{AreaId, AreaPartition};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// A cached value together with the generation it was computed at
#[derive(Debug, Clone)]
pub struct Stamped<T> {
    pub value: T,
    pub generation: u64,
}

impl<T> Stamped<T> {
    pub fn new(value: T, generation: u64) -> Self {
        Self { value, generation }
    }

    /// Whether this entry is still valid at `generation`
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Lookups answered from a current entry
    pub hits: u64,
    /// Lookups with no entry at all
    pub misses: u64,
    /// Lookups that found an entry from an older generation
    pub stale: u64,
}

impl CacheMetrics {
    /// Get hit rate as a fraction (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale += 1;
    }

    fn record_lookup<T>(&mut self, entry: Option<&Stamped<T>>, generation: u64) -> bool {
        match entry {
            Some(e) if e.is_current(generation) => {
                self.record_hit();
                true
            }
            Some(_) => {
                self.record_stale();
                false
            }
            None => {
                self.record_miss();
                false
            }
        }
    }
}

type InAreaKey = (AreaId, NodeId, NodeId);
type AreaPathKey = (AreaId, AreaId);

/// Memoized in-area and area-to-area paths.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    in_area: HashMap<InAreaKey, Stamped<Arc<[NodeId]>>>,
    area_paths: HashMap<AreaPathKey, Stamped<Option<Arc<[AreaId]>>>>,
    metrics: CacheMetrics,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortest path from `from` to `to` using only members of `area`.
    ///
    /// Returns `None` when either endpoint is outside the area or the area
    /// does not connect them. Only found paths are stored.
    pub fn in_area_path(
        &mut self,
        graph: &Graph,
        partition: &AreaPartition,
        area: AreaId,
        from: NodeId,
        to: NodeId,
    ) -> Option<Arc<[NodeId]>> {
        let generation = partition.generation();
        let key = (area, from, to);
        if self.metrics.record_lookup(self.in_area.get(&key), generation) {
            return self.in_area.get(&key).map(|e| Arc::clone(&e.value));
        }

        let members = partition.get_area(area)?;
        let path: Arc<[NodeId]> = graph
            .shortest_path_within(from, to, |v| members.contains(v))?
            .into();
        trace!(%area, from, to, len = path.len(), "in-area path computed");

        self.in_area
            .insert(key, Stamped::new(Arc::clone(&path), generation));
        Some(path)
    }

    /// Fewest-hop area sequence from `from` to `to` on `meta`.
    ///
    /// Unreachable pairs are cached as well.
    pub fn area_path(
        &mut self,
        meta: &MetaGraph,
        generation: u64,
        from: AreaId,
        to: AreaId,
    ) -> Option<Arc<[AreaId]>> {
        let key = (from, to);
        if self.metrics.record_lookup(self.area_paths.get(&key), generation) {
            return self.area_paths.get(&key).and_then(|e| e.value.clone());
        }

        let path: Option<Arc<[AreaId]>> = meta.area_path(from, to).map(Into::into);
        trace!(%from, %to, found = path.is_some(), "area path computed");

        self.area_paths
            .insert(key, Stamped::new(path.clone(), generation));
        path
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = CacheMetrics::default();
    }

    /// Number of stored entries, current or stale
    pub fn len(&self) -> usize {
        self.in_area.len() + self.area_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.in_area.clear();
        self.area_paths.clear();
    }
}
