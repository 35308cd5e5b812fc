//! Partition Search Driver
//!
//! Anytime local search over partitions, bounded by a wall-clock deadline.
//!
//! # Architecture
//!
//! ```text
//! setup:  tie along visitation hops  ->  cover remaining nodes
//! round:  snapshot best ─┬─ worker 0: clone, augment x batch, evaluate window ─┐
//!                        ├─ worker 1: ...                                      ├─> BestSlot (strictly lower wins)
//!                        └─ worker k: ...                                      ┘
//! finish: play the whole order on the best field  ->  Solution
//! ```
//!
//! Workers run on the rayon pool when more than one is configured. Each
//! worker seeds its own `ChaCha8Rng` from the run seed, the round and the
//! worker index, so a fixed seed and worker count replay the same
//! candidates (up to deadline effects).

use crate::cache::CacheMetrics;
use crate::deadline::Deadline;
use crate::field::Field;
use crate::graph::{GraphError, NodeId};
use crate::partition::{CoverOrder, PartitionError, PartitionStats, TieOptions, DEFAULT_CHUNK_OVERLAP};
use crate::problem::Problem;
use crate::router::RouteError;
use crate::solution::Solution;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Default total time budget
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_millis(1900);

/// Default time kept back for the final play-through
pub const DEFAULT_PLAY_RESERVE: Duration = Duration::from_millis(150);

/// Default number of hops sampled per augmentation
pub const DEFAULT_SAMPLE_SIZE: usize = 24;

/// Default augmentations applied to a candidate per round
pub const DEFAULT_AUGMENT_BATCH: usize = 4;

/// Default run seed
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Tuning knobs for [`SearchDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub time_limit: Duration,
    pub play_reserve: Duration,
    pub sample_size: usize,
    pub augment_batch: usize,
    /// Number of leading targets evaluated per candidate (0 = all)
    pub eval_window: usize,
    pub workers: usize,
    pub seed: u64,
    pub cover_order: CoverOrder,
    pub chunk_overlap: usize,
    /// Tie consecutive targets before covering
    pub tie_order_hops: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            play_reserve: DEFAULT_PLAY_RESERVE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            augment_batch: DEFAULT_AUGMENT_BATCH,
            eval_window: 0,
            workers: 1,
            seed: DEFAULT_SEED,
            cover_order: CoverOrder::Shuffled,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            tie_order_hops: true,
        }
    }
}

impl SearchConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),

    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("routing error: {0}")]
    Route(#[from] RouteError),
}

/// Figures collected over one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub rounds: usize,
    pub candidates: usize,
    pub improvements: usize,
    pub discarded: usize,
    pub ties_accepted: usize,
    pub ties_rejected: usize,
    /// Evaluation-window cost right after the initial cover
    pub initial_cost: Option<usize>,
    /// Evaluation-window cost of the best field
    pub best_cost: Option<usize>,
    /// Reloads in the emitted solution
    pub score: usize,
    pub elapsed_ms: u64,
    pub partition: Option<PartitionStats>,
    pub cache: CacheMetrics,
}

/// The emitted solution plus run statistics
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub solution: Solution,
    pub stats: SearchStats,
}

/// What happened to one worker's candidate
enum Offer {
    Improved,
    Rejected,
    Idle,
}

/// The best field found so far and its evaluation cost.
struct BestSlot {
    inner: Mutex<(Field, usize)>,
}

impl BestSlot {
    fn new(field: Field, cost: usize) -> Self {
        Self {
            inner: Mutex::new((field, cost)),
        }
    }

    fn snapshot(&self) -> (Field, usize) {
        let guard = self.inner.lock();
        (guard.0.clone(), guard.1)
    }

    /// Replace the best when `cost` is strictly lower.
    fn offer(&self, field: Field, cost: usize) -> bool {
        let mut guard = self.inner.lock();
        if cost < guard.1 {
            *guard = (field, cost);
            true
        } else {
            false
        }
    }

    fn into_inner(self) -> (Field, usize) {
        self.inner.into_inner()
    }
}

/// Time-boxed partition search.
pub struct SearchDriver {
    config: SearchConfig,
}

impl SearchDriver {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the initial field: ties along the visitation hops, then a
    /// full cover.
    pub fn initial_field(&self, problem: &Problem, stats: &mut SearchStats) -> Result<Field, SearchError> {
        self.build_field(problem, stats, &Deadline::unbounded())
    }

    /// Hop ties stop once `deadline` passes; the cover always runs.
    fn build_field(
        &self,
        problem: &Problem,
        stats: &mut SearchStats,
        deadline: &Deadline,
    ) -> Result<Field, SearchError> {
        let graph = Arc::new(problem.graph()?);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut field = Field::new(graph, problem.capacity_a, problem.capacity_b)
            .with_chunk_overlap(self.config.chunk_overlap);

        if self.config.tie_order_hops {
            let options = TieOptions {
                allow_overwrite: false,
                require_exact_fit: true,
                reserve_for_cover: true,
            };
            for hop in problem.route().windows(2) {
                if deadline.expired() {
                    debug!(accepted = stats.ties_accepted, "deadline reached while tying hops");
                    break;
                }
                match field.tie(hop[0], hop[1], options) {
                    Ok(_) => stats.ties_accepted += 1,
                    Err(reason) => {
                        trace!(from = hop[0], to = hop[1], %reason, "tie rejected");
                        stats.ties_rejected += 1;
                    }
                }
            }
        }

        field.cover_remaining(self.config.cover_order, &mut rng)?;
        field.sync();
        info!(
            areas = field.partition().area_count(),
            used = field.partition().directory_used(),
            capacity = field.partition().capacity_a(),
            ties = stats.ties_accepted,
            "initial partition built"
        );
        Ok(field)
    }

    /// Run the search and play the visitation order on the best field.
    pub fn run(&self, problem: &Problem) -> Result<SearchOutcome, SearchError> {
        let deadline = Deadline::new(self.config.time_limit);
        let search_deadline = deadline.reserving(self.config.play_reserve);
        let mut stats = SearchStats::default();

        let mut field = self.build_field(problem, &mut stats, &search_deadline)?;
        let route = problem.route();
        let window = self.window(&problem.order);

        let initial = field.evaluate(window, &search_deadline)?;
        stats.initial_cost = initial;
        if initial.is_none() {
            debug!("no time left after setup, skipping search rounds");
        }
        let best = BestSlot::new(field, initial.unwrap_or(usize::MAX));

        while initial.is_some() && !search_deadline.expired() {
            let (base, base_cost) = best.snapshot();
            if base.partition().is_full() {
                debug!(round = stats.rounds, "directory full, stopping search");
                break;
            }
            stats.rounds += 1;
            let round = stats.rounds;

            let offers: Vec<Result<Offer, RouteError>> = if self.config.workers > 1 {
                (0..self.config.workers)
                    .into_par_iter()
                    .map(|worker| self.explore(&base, &best, &route, window, round, worker, &search_deadline))
                    .collect()
            } else {
                vec![self.explore(&base, &best, &route, window, round, 0, &search_deadline)]
            };

            for offer in offers {
                match offer {
                    Ok(Offer::Improved) => {
                        stats.candidates += 1;
                        stats.improvements += 1;
                    }
                    Ok(Offer::Rejected) => stats.candidates += 1,
                    Ok(Offer::Idle) => {}
                    Err(e) if e.is_invariant_violation() => {
                        warn!(round, error = %e, "discarding candidate");
                        stats.discarded += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            debug!(round, base_cost, "search round complete");
        }

        let (mut field, best_cost) = best.into_inner();
        stats.best_cost = (best_cost != usize::MAX).then_some(best_cost);

        field.reset_agent();
        field.play(&problem.order)?;
        let solution = Solution::from_field(&field);

        stats.score = solution.score();
        stats.elapsed_ms = deadline.elapsed().as_millis() as u64;
        stats.partition = Some(field.partition().stats());
        stats.cache = field.cache().metrics().clone();

        info!(
            score = stats.score,
            rounds = stats.rounds,
            improvements = stats.improvements,
            elapsed_ms = stats.elapsed_ms,
            "search finished"
        );
        Ok(SearchOutcome { solution, stats })
    }

    fn window<'o>(&self, order: &'o [NodeId]) -> &'o [NodeId] {
        match self.config.eval_window {
            0 => order,
            n => &order[..n.min(order.len())],
        }
    }

    /// Grow one candidate from `base` and offer it to `best`.
    #[allow(clippy::too_many_arguments)]
    fn explore(
        &self,
        base: &Field,
        best: &BestSlot,
        route: &[NodeId],
        window: &[NodeId],
        round: usize,
        worker: usize,
        deadline: &Deadline,
    ) -> Result<Offer, RouteError> {
        let mut rng = ChaCha8Rng::seed_from_u64(worker_seed(self.config.seed, round, worker));
        let mut field = base.clone();

        let mut augmented = 0;
        for _ in 0..self.config.augment_batch {
            if field.partition().is_full() || deadline.expired() {
                break;
            }
            if field.augment(route, self.config.sample_size, &mut rng).is_some() {
                augmented += 1;
            }
        }
        if augmented == 0 {
            return Ok(Offer::Idle);
        }

        let Some(cost) = field.evaluate(window, deadline)? else {
            return Ok(Offer::Idle);
        };
        if best.offer(field, cost) {
            debug!(round, worker, cost, augmented, "new best partition");
            Ok(Offer::Improved)
        } else {
            Ok(Offer::Rejected)
        }
    }
}

fn worker_seed(seed: u64, round: usize, worker: usize) -> u64 {
    seed ^ (round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (worker as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

/// Solve `problem` with `config`.
pub fn solve(problem: &Problem, config: SearchConfig) -> Result<SearchOutcome, SearchError> {
    SearchDriver::new(config).run(problem)
}
