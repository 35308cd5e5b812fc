//! Partition invariant checks for integration tests.

#![allow(dead_code)]

use sigroute_core::{AreaPartition, Graph, NodeId, Operation};
use std::collections::HashSet;

// ============================================================================
// Validation Result Types
// ============================================================================

/// Result of partition validation
#[derive(Debug, Default)]
pub struct PartitionValidationResult {
    /// Area size / directory layout violations
    pub layout_errors: Vec<String>,
    /// Membership index disagreements
    pub membership_errors: Vec<String>,
}

impl PartitionValidationResult {
    pub fn is_valid(&self) -> bool {
        self.layout_errors.is_empty() && self.membership_errors.is_empty()
    }

    pub fn all_errors(&self) -> Vec<String> {
        let mut all = Vec::new();
        all.extend(self.layout_errors.iter().map(|e| format!("[layout] {}", e)));
        all.extend(
            self.membership_errors
                .iter()
                .map(|e| format!("[membership] {}", e)),
        );
        all
    }
}

// ============================================================================
// Validators
// ============================================================================

/// Check area sizes, directory layout and the membership index.
pub fn validate_partition(partition: &AreaPartition, require_cover: bool) -> PartitionValidationResult {
    let mut result = PartitionValidationResult::default();
    let directory = partition.directory();
    let mut expected_offset = 0;

    for area in partition.areas() {
        if area.is_empty() || area.len() > partition.capacity_b() {
            result.layout_errors.push(format!(
                "{} has {} members (buffer {})",
                area.id(),
                area.len(),
                partition.capacity_b()
            ));
        }
        if area.offset() != expected_offset {
            result.layout_errors.push(format!(
                "{} starts at {}, expected {}",
                area.id(),
                area.offset(),
                expected_offset
            ));
        }
        if directory[area.directory_range()] != *area.members() {
            result
                .layout_errors
                .push(format!("{} members differ from its directory slice", area.id()));
        }
        expected_offset += area.len();

        let distinct: HashSet<NodeId> = area.members().iter().copied().collect();
        if distinct.len() != area.len() {
            result
                .layout_errors
                .push(format!("{} repeats a member", area.id()));
        }
        for &node in area.members() {
            if !partition.areas_of(node).contains(&area.id()) {
                result
                    .membership_errors
                    .push(format!("node {} missing {} in its index", node, area.id()));
            }
        }
    }

    if expected_offset > partition.capacity_a() {
        result.layout_errors.push(format!(
            "areas use {} slots, directory holds {}",
            expected_offset,
            partition.capacity_a()
        ));
    }

    if require_cover {
        for node in 0..partition.node_count() {
            if !partition.is_covered(node) {
                result
                    .membership_errors
                    .push(format!("node {} has no area", node));
            }
        }
    }

    result
}

/// Assert that the steps in `ops`, starting at `start`, walk graph edges
/// and end on `dest`.
pub fn assert_steps_adjacent(graph: &Graph, start: NodeId, ops: &[Operation], dest: NodeId) {
    let mut current = start;
    for op in ops {
        if let Operation::Step(next) = *op {
            assert!(
                graph.is_adjacent(current, next),
                "step {} -> {} is not an edge",
                current,
                next
            );
            current = next;
        }
    }
    assert_eq!(current, dest, "walk ended on {} instead of {}", current, dest);
}
