//! sigroute Core - Area partitioning and reload-minimizing routing
//!
//! This crate provides the core functionality of the solver:
//! - Static road graph and breadth-first path queries
//! - Area partition laid out in a fixed-capacity directory
//! - Incrementally built area meta-graph and generation-stamped path cache
//! - Router emitting reload / step operations
//! - Time-boxed partition search driver
//! - Problem / solution text formats, a replay judge and a seeded
//!   instance generator

pub mod cache;
pub mod deadline;
pub mod field;
pub mod generate;
pub mod graph;
pub mod judge;
pub mod meta;
pub mod operation;
pub mod partition;
pub mod problem;
pub mod router;
pub mod search;
pub mod solution;

// Re-exports for convenience
pub use cache::{CacheMetrics, PathCache, Stamped};
pub use deadline::Deadline;
pub use field::{AugmentOutcome, Field};
pub use generate::{generate, GenerateError, GeneratorConfig};
pub use graph::{Graph, GraphError, NodeId, START_NODE};
pub use meta::{MetaGraph, Port};
pub use operation::{Operation, OperationLog};
pub use partition::{
    Area, AreaId, AreaPartition, CoverOrder, PartitionError, PartitionStats, TieOptions,
    TieRejection, DEFAULT_CHUNK_OVERLAP, SENTINEL_NODE,
};
pub use router::{Agent, MoveMode, MovePlan, RouteError, Router};

// Problem / solution re-exports
pub use judge::{judge, JudgeError, JudgeReport, MAX_OPERATIONS};
pub use problem::{Problem, ProblemError, ProblemStats};
pub use solution::{Solution, SolutionError};

// Search re-exports
pub use search::{solve, SearchConfig, SearchDriver, SearchError, SearchOutcome, SearchStats};
