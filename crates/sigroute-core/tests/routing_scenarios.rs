//! Routing Scenario Tests
//!
//! End-to-end checks of the partition / meta-graph / router stack:
//! - The reference path scenario and its exact operation log
//! - Cover and tie invariants on larger graphs
//! - Reload costs never rising when areas are added
//! - Every committed log replays through the judge
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package sigroute-core --test routing_scenarios
//! ```

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use common::{
    assert_steps_adjacent, grid_edges, grid_problem, ring_edges, scenario_problem,
    validate_partition,
};
use sigroute_core::{
    judge, Agent, AreaId, CoverOrder, Deadline, Field, Graph, MoveMode, Operation, PathCache,
    Router, Solution, TieOptions, TieRejection, START_NODE,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn field_for(problem: &sigroute_core::Problem) -> Field {
    let graph = Arc::new(problem.graph().unwrap());
    Field::new(graph, problem.capacity_a, problem.capacity_b)
}

/// Reloads needed to reach `to` from `from` with an empty buffer
fn fresh_cost(field: &mut Field, from: usize, to: usize) -> usize {
    field.sync();
    let mut cache = PathCache::new();
    let mut router = Router::new(field.graph(), field.partition(), field.meta(), &mut cache);
    router.plan(&Agent::new(from), to).unwrap().reloads
}

fn reload(len: usize, offset: usize) -> Operation {
    Operation::Reload {
        len,
        directory_offset: offset,
        buffer_offset: 0,
    }
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn test_path_scenario_log_and_score() {
    let problem = scenario_problem();
    let mut field = field_for(&problem);
    field
        .cover_remaining(CoverOrder::Ascending, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap();

    let a0 = field.partition().area(AreaId(0));
    assert_eq!((a0.members(), a0.offset()), (&[0, 1, 2][..], 0));
    let a1 = field.partition().area(AreaId(1));
    assert_eq!((a1.members(), a1.offset()), (&[3, 4][..], 3));

    let reloads = field.play(&problem.order).unwrap();
    assert_eq!(reloads, 3);
    assert_eq!(
        field.log().ops(),
        &[
            reload(3, 0),
            Operation::Step(1),
            Operation::Step(2),
            reload(2, 3),
            Operation::Step(3),
            Operation::Step(4),
            Operation::Step(3),
            reload(3, 0),
            Operation::Step(2),
            Operation::Step(1),
            Operation::Step(0),
        ]
    );

    let solution = Solution::from_field(&field);
    assert_eq!(
        solution.to_string().lines().next(),
        Some("0 1 2 3 4 0")
    );
    let report = judge(&problem, &solution).unwrap();
    assert_eq!(report.score, 3);
    assert_eq!(report.targets_visited, 3);
}

#[test]
fn test_solution_text_round_trips_through_judge() {
    let problem = scenario_problem();
    let mut field = field_for(&problem);
    field
        .cover_remaining(CoverOrder::Ascending, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap();
    field.play(&problem.order).unwrap();

    let text = Solution::from_field(&field).to_string();
    let parsed = Solution::parse(&text, &problem).unwrap();
    let s_lines = text.lines().filter(|l| l.starts_with("s ")).count();
    assert_eq!(judge(&problem, &parsed).unwrap().score, s_lines);
}

// ============================================================================
// Partition Invariants
// ============================================================================

#[test]
fn test_cover_invariants_on_grid() {
    for seed in 0..5 {
        let problem = grid_problem(7, 6, 84, 5);
        let mut field = field_for(&problem);
        field
            .cover_remaining(CoverOrder::Shuffled, &mut ChaCha8Rng::seed_from_u64(seed))
            .unwrap();

        let result = validate_partition(field.partition(), true);
        assert!(result.is_valid(), "seed {}: {:?}", seed, result.all_errors());
    }
}

#[test]
fn test_ties_then_cover_keep_invariants() {
    let problem = grid_problem(6, 6, 60, 4);
    let mut field = field_for(&problem);
    let options = TieOptions {
        allow_overwrite: false,
        require_exact_fit: true,
        reserve_for_cover: true,
    };

    let route = problem.route();
    for hop in route.windows(2) {
        match field.tie(hop[0], hop[1], options) {
            Ok(used) => assert!(used >= problem.capacity_b),
            Err(TieRejection::InsufficientCapacity { needed, available }) => {
                assert!(needed > available)
            }
            Err(_) => {}
        }
    }
    field
        .cover_remaining(CoverOrder::Shuffled, &mut ChaCha8Rng::seed_from_u64(9))
        .unwrap();

    let result = validate_partition(field.partition(), true);
    assert!(result.is_valid(), "{:?}", result.all_errors());
}

#[test]
fn test_exact_fit_rejection_keeps_generation() {
    let problem = grid_problem(5, 5, 50, 4);
    let mut field = field_for(&problem);
    let generation = field.partition().generation();

    let options = TieOptions {
        require_exact_fit: true,
        ..Default::default()
    };
    // 0 -> 1 is a two-node path, shorter than the buffer
    assert_eq!(
        field.tie(0, 1, options),
        Err(TieRejection::NotExactFit {
            path_len: 2,
            capacity: 4
        })
    );
    assert_eq!(field.partition().generation(), generation);
    assert_eq!(field.partition().area_count(), 0);
}

// ============================================================================
// Router Properties
// ============================================================================

#[test]
fn test_committed_moves_walk_edges() {
    let problem = grid_problem(6, 5, 60, 4);
    let mut field = field_for(&problem);
    field
        .cover_remaining(CoverOrder::Shuffled, &mut ChaCha8Rng::seed_from_u64(2))
        .unwrap();

    for &dest in &problem.order {
        let start = field.agent().current;
        let plan = field.move_to(dest, MoveMode::Commit).unwrap();
        assert_steps_adjacent(field.graph(), start, &plan.ops, dest);
        assert_eq!(field.agent().current, dest);
    }

    let report = judge(&problem, &Solution::from_field(&field)).unwrap();
    assert_eq!(report.score, field.log().reloads());
}

#[test]
fn test_signed_area_moves_are_free() {
    let problem = scenario_problem();
    let mut field = field_for(&problem);
    field
        .cover_remaining(CoverOrder::Ascending, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap();

    field.move_to(1, MoveMode::Commit).unwrap();
    assert_eq!(field.agent().signed, Some(AreaId(0)));
    let plan = field.move_to(2, MoveMode::Simulate).unwrap();
    assert_eq!(plan.reloads, 0);
    let back = field.move_to(0, MoveMode::Simulate).unwrap();
    assert_eq!(back.reloads, 0);
}

#[test]
fn test_added_areas_never_raise_hop_cost() {
    let n = 24;
    let graph = Arc::new(Graph::from_edges(n, &ring_edges(n)).unwrap());
    let mut field = Field::new(graph, 80, 4);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    field.cover_remaining(CoverOrder::Shuffled, &mut rng).unwrap();

    let hops: Vec<(usize, usize)> = vec![(0, 12), (3, 17), (20, 8), (5, 6)];
    let before: Vec<usize> = hops.iter().map(|&(a, b)| fresh_cost(&mut field, a, b)).collect();

    let allow = TieOptions {
        allow_overwrite: true,
        ..Default::default()
    };
    let _ = field.tie(0, 12, allow);
    let route = [START_NODE, 12, 3, 17, 20, 8];
    for _ in 0..4 {
        field.augment(&route, 16, &mut rng);
    }

    for (&(a, b), &old) in hops.iter().zip(&before) {
        let new = fresh_cost(&mut field, a, b);
        assert!(new <= old, "hop {} -> {} went from {} to {}", a, b, old, new);
    }
    let result = validate_partition(field.partition(), true);
    assert!(result.is_valid(), "{:?}", result.all_errors());
}

#[test]
fn test_evaluate_matches_committed_play() {
    let problem = grid_problem(8, 8, 128, 6);
    let mut field = field_for(&problem);
    field
        .cover_remaining(CoverOrder::Shuffled, &mut ChaCha8Rng::seed_from_u64(8))
        .unwrap();

    let simulated = field
        .evaluate(&problem.order, &Deadline::unbounded())
        .unwrap()
        .unwrap();
    let played = field.play(&problem.order).unwrap();
    assert_eq!(simulated, played);
    assert_eq!(Some(&field.agent().current), problem.order.last());
}

#[test]
fn test_grid_edges_helper_builds_connected_graph() {
    let graph = Graph::from_edges(12, &grid_edges(4, 3)).unwrap();
    assert_eq!(graph.edge_count(), 17);
    assert!(graph.shortest_path(0, 11).is_some());
}
