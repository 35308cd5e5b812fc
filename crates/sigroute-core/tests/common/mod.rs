//! Common test utilities for integration tests.
//!
//! Graph / problem builders and the partition invariant checks shared
//! across integration test files.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod partition_validator;

pub use fixtures::{grid_edges, grid_problem, path_edges, path_problem, ring_edges, scenario_problem};
pub use partition_validator::{assert_steps_adjacent, validate_partition, PartitionValidationResult};
