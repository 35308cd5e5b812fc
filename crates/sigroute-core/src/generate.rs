//! Instance Generator
//!
//! Seeded random instances in the contest shape:
//!
//! ```text
//! seed ─> ChaCha8Rng ─┬─ capacities   LA in N..=2N, LB = floor(u^2) for u in [2, 5)
//!                     ├─ knobs        vertex spacing, longest edge, erase ratio
//!                     ├─ planar graph points -> non-crossing edges -> pruning
//!                     │               (whole graph redrawn until connected)
//!                     └─ targets      uniform, never the node just reached
//! ```
//!
//! Points are scattered on a square whose side grows with the square root
//! of the node count, so smaller instances keep the density of the
//! 600-node default. Candidate edges join pairs closer than the longest
//! edge; short candidates are laid first, and an edge crossing an earlier
//! one is skipped. Pruning then drops each edge with the erase probability
//! as long as the graph stays connected.

use crate::graph::{NodeId, START_NODE};
use crate::problem::Problem;
use petgraph::unionfind::UnionFind;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

/// Node count of a default instance
pub const DEFAULT_NODE_COUNT: usize = 600;

/// Target count of a default instance
pub const DEFAULT_TARGET_COUNT: usize = 600;

/// Square side for [`DEFAULT_NODE_COUNT`] points
const DEFAULT_SIDE: f64 = 1000.0;

/// Bounds of a buffer length
const BUFFER_MIN: usize = 4;
const BUFFER_MAX: usize = 24;

/// Redraws of the whole graph before giving up
const MAX_ATTEMPTS: usize = 64;

/// Rejected point draws allowed per node
const PLACEMENT_TRIES_PER_NODE: usize = 10_000;

type Point = (i64, i64);

/// Errors raised while generating an instance
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("{what} = {value} is outside {min}..={max}")]
    OutOfRange {
        what: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("no connected planar graph after {attempts} attempts")]
    Disconnected { attempts: usize },
}

/// Shape of the generated instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub node_count: usize,
    pub target_count: usize,
    /// Directory length, drawn from `node_count..=2 * node_count` when `None`
    pub capacity_a: Option<usize>,
    /// Buffer length, drawn as `floor(u^2)` for `u` in `[2, 5)` when `None`
    pub capacity_b: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
            target_count: DEFAULT_TARGET_COUNT,
            capacity_a: None,
            capacity_b: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }

    pub fn with_capacity_a(mut self, capacity_a: usize) -> Self {
        self.capacity_a = Some(capacity_a);
        self
    }

    pub fn with_capacity_b(mut self, capacity_b: usize) -> Self {
        self.capacity_b = Some(capacity_b);
        self
    }
}

/// Random drawing parameters of one instance
#[derive(Debug, Clone, Copy)]
struct Knobs {
    min_spacing: i64,
    max_edge: i64,
    erase_ratio: f64,
    side: i64,
}

/// Generate the instance for `seed`.
pub fn generate(seed: u64, config: &GeneratorConfig) -> Result<Problem, GenerateError> {
    let node_count = config.node_count;
    if node_count < 2 {
        return Err(GenerateError::OutOfRange {
            what: "N",
            value: node_count,
            min: 2,
            max: usize::MAX,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let capacity_a = match config.capacity_a {
        Some(value) => value,
        None => rng.gen_range(node_count..=2 * node_count),
    };
    check_range("LA", capacity_a, node_count, 2 * node_count)?;

    let capacity_b = match config.capacity_b {
        Some(value) => value,
        None => {
            let root: f64 = rng.gen_range(2.0..5.0);
            ((root * root).floor() as usize).min(capacity_a)
        }
    };
    check_range("LB", capacity_b, BUFFER_MIN.min(capacity_a), BUFFER_MAX.min(capacity_a))?;

    let knobs = Knobs {
        min_spacing: rng.gen_range(20..=30),
        max_edge: rng.gen_range(80..=140),
        erase_ratio: rng.gen_range(0.0..0.5),
        side: (DEFAULT_SIDE * (node_count as f64 / DEFAULT_NODE_COUNT as f64).sqrt()).round() as i64,
    };

    let mut drawn = None;
    for attempt in 1..=MAX_ATTEMPTS {
        drawn = planar_graph(node_count, &knobs, &mut rng);
        if drawn.is_some() {
            debug!(seed, attempt, "planar graph drawn");
            break;
        }
    }
    let (edges, coordinates) = drawn.ok_or(GenerateError::Disconnected {
        attempts: MAX_ATTEMPTS,
    })?;

    let mut order = Vec::with_capacity(config.target_count);
    let mut current = START_NODE;
    for _ in 0..config.target_count {
        let pick = rng.gen_range(0..node_count - 1);
        current = if pick < current { pick } else { pick + 1 };
        order.push(current);
    }

    debug!(
        seed,
        nodes = node_count,
        edges = edges.len(),
        capacity_a,
        capacity_b,
        "instance generated"
    );
    Ok(Problem {
        node_count,
        edges,
        order,
        capacity_a,
        capacity_b,
        coordinates,
    })
}

fn check_range(what: &'static str, value: usize, min: usize, max: usize) -> Result<(), GenerateError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GenerateError::OutOfRange {
            what,
            value,
            min,
            max,
        })
    }
}

fn distance2(a: Point, b: Point) -> i64 {
    (a.0 - b.0).pow(2) + (a.1 - b.1).pow(2)
}

/// Scatter `n` points at least `min_spacing` apart. `None` when the square
/// is too crowded to place them all.
fn scatter<R: Rng + ?Sized>(n: usize, knobs: &Knobs, rng: &mut R) -> Option<Vec<Point>> {
    let spacing2 = knobs.min_spacing.pow(2);
    let mut points: Vec<Point> = Vec::with_capacity(n);
    let mut rejected = 0;

    while points.len() < n {
        let p = (rng.gen_range(0..=knobs.side), rng.gen_range(0..=knobs.side));
        if points.iter().any(|&q| distance2(p, q) < spacing2) {
            rejected += 1;
            if rejected > n * PLACEMENT_TRIES_PER_NODE {
                return None;
            }
            continue;
        }
        points.push(p);
    }
    Some(points)
}

/// One draw of points and pruned planar edges; `None` if disconnected.
fn planar_graph<R: Rng + ?Sized>(
    n: usize,
    knobs: &Knobs,
    rng: &mut R,
) -> Option<(Vec<(NodeId, NodeId)>, Vec<Point>)> {
    let points = scatter(n, knobs, rng)?;
    let max2 = knobs.max_edge.pow(2);

    let mut short = Vec::new();
    let mut long = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            let d2 = distance2(points[i], points[j]);
            if d2 > max2 {
                continue;
            }
            // within half the longest edge
            if 4 * d2 <= max2 {
                short.push((i, j));
            } else {
                long.push((i, j));
            }
        }
    }

    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    for mut candidates in [short, long] {
        candidates.shuffle(rng);
        for (u, v) in candidates {
            let segment = (points[u], points[v]);
            if edges
                .iter()
                .all(|&(a, b)| !segments_cross(segment, (points[a], points[b])))
            {
                edges.push((u, v));
            }
        }
    }

    edges.shuffle(rng);
    let mut keep = vec![true; edges.len()];
    if !is_connected(n, &edges, &keep) {
        return None;
    }
    for i in 0..edges.len() {
        keep[i] = false;
        if is_connected(n, &edges, &keep) {
            keep[i] = rng.gen_range(0.0..1.0) > knobs.erase_ratio;
        } else {
            keep[i] = true;
        }
    }

    let edges = edges
        .into_iter()
        .zip(keep)
        .filter_map(|(edge, kept)| kept.then_some(edge))
        .collect();
    Some((edges, points))
}

fn is_connected(n: usize, edges: &[(NodeId, NodeId)], keep: &[bool]) -> bool {
    let mut sets = UnionFind::<usize>::new(n);
    let merges = edges
        .iter()
        .zip(keep)
        .filter(|&(&(u, v), &kept)| kept && sets.union(u, v))
        .count();
    merges + 1 == n
}

/// Orientation of `c` relative to the directed line `a -> b`
fn orientation(a: Point, b: Point, c: Point) -> i64 {
    ((b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)).signum()
}

fn in_box(p: Point, a: Point, b: Point) -> bool {
    a.0.min(b.0) <= p.0 && p.0 <= a.0.max(b.0) && a.1.min(b.1) <= p.1 && p.1 <= a.1.max(b.1)
}

/// Whether two segments touch anywhere other than a shared endpoint.
/// Collinear segments that overlap always cross.
fn segments_cross(s: (Point, Point), t: (Point, Point)) -> bool {
    let (p0, p1) = s;
    let (p2, p3) = t;
    let d0 = orientation(p0, p1, p2);
    let d1 = orientation(p0, p1, p3);

    if d0 == 0 && d1 == 0 {
        return in_box(p2, p0, p1) || in_box(p3, p0, p1) || in_box(p0, p2, p3) || in_box(p1, p2, p3);
    }
    if p0 == p2 || p0 == p3 || p1 == p2 || p1 == p3 {
        return false;
    }

    let d2 = orientation(p2, p3, p0);
    let d3 = orientation(p2, p3, p1);
    d0 * d1 <= 0 && d2 * d3 <= 0
}
