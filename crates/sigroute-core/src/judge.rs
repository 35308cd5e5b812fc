//! Replay Judge
//!
//! Replays a [`Solution`] against a [`Problem`] operation by operation and
//! reports its score, rejecting the first invalid operation.
//!
//! The buffer is tracked slot by slot: a reload overwrites only the slots
//! it copies into, and a node is enterable while at least one buffer slot
//! holds it.
//!
//! Targets are matched one step at a time: a step onto the next pending
//! target consumes exactly that target. Standing on a target, including the
//! start node, consumes nothing.

use crate::graph::{NodeId, START_NODE};
use crate::operation::Operation;
use crate::problem::Problem;
use crate::solution::Solution;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Upper bound on the number of operations in one solution
pub const MAX_OPERATIONS: usize = 100_000;

/// Reasons a solution is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JudgeError {
    #[error(transparent)]
    Graph(#[from] crate::graph::GraphError),

    #[error("directory has {found} entries, expected {expected}")]
    DirectoryLength { expected: usize, found: usize },

    #[error("directory entry {index} is node {node}, outside 0..{node_count}")]
    DirectoryNode {
        index: usize,
        node: NodeId,
        node_count: usize,
    },

    #[error("{count} operations exceed the limit of {limit}")]
    TooManyOperations { count: usize, limit: usize },

    #[error("operation {index}: reload length must be at least 1")]
    EmptyReload { index: usize },

    #[error(
        "operation {index}: reload of {len} from {directory_offset} to {buffer_offset} \
         leaves the directory ({capacity_a}) or buffer ({capacity_b})"
    )]
    ReloadOutOfBounds {
        index: usize,
        len: usize,
        directory_offset: usize,
        buffer_offset: usize,
        capacity_a: usize,
        capacity_b: usize,
    },

    #[error("operation {index}: node {node} is outside 0..{node_count}")]
    NodeOutOfRange {
        index: usize,
        node: NodeId,
        node_count: usize,
    },

    #[error("operation {index}: node {node} is not in the buffer")]
    NotInBuffer { index: usize, node: NodeId },

    #[error("operation {index}: node {to} is not adjacent to node {from}")]
    NotAdjacent { index: usize, from: NodeId, to: NodeId },

    #[error("only {visited} of {total} targets were visited")]
    TargetsRemaining { visited: usize, total: usize },
}

/// Outcome of an accepted replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeReport {
    /// Number of reloads
    pub score: usize,
    pub operations: usize,
    pub steps: usize,
    pub targets_visited: usize,
}

struct Replay<'a> {
    problem: &'a Problem,
    buffer: Vec<Option<NodeId>>,
    /// Buffer slots currently holding each node
    held: Vec<usize>,
    current: NodeId,
    next_target: usize,
}

impl<'a> Replay<'a> {
    fn new(problem: &'a Problem) -> Self {
        Self {
            problem,
            buffer: vec![None; problem.capacity_b],
            held: vec![0; problem.node_count],
            current: START_NODE,
            next_target: 0,
        }
    }

    fn reload(&mut self, directory: &[NodeId], len: usize, pa: usize, pb: usize) {
        for (slot, &node) in self.buffer[pb..pb + len]
            .iter_mut()
            .zip(&directory[pa..pa + len])
        {
            if let Some(old) = slot.replace(node) {
                self.held[old] -= 1;
            }
            self.held[node] += 1;
        }
    }

    fn step(&mut self, to: NodeId) {
        if self.problem.order.get(self.next_target) == Some(&to) {
            self.next_target += 1;
        }
        self.current = to;
    }
}

/// `offset + len > capacity`, treating overflow as out of bounds
fn exceeds(offset: usize, len: usize, capacity: usize) -> bool {
    offset.checked_add(len).map_or(true, |end| end > capacity)
}

/// Replay `solution` against `problem`.
pub fn judge(problem: &Problem, solution: &Solution) -> Result<JudgeReport, JudgeError> {
    let graph = problem.graph()?;
    let node_count = problem.node_count;
    let directory = &solution.directory;

    if directory.len() != problem.capacity_a {
        return Err(JudgeError::DirectoryLength {
            expected: problem.capacity_a,
            found: directory.len(),
        });
    }
    if let Some((index, &node)) = directory.iter().enumerate().find(|&(_, &n)| n >= node_count) {
        return Err(JudgeError::DirectoryNode {
            index,
            node,
            node_count,
        });
    }
    if solution.log.len() > MAX_OPERATIONS {
        return Err(JudgeError::TooManyOperations {
            count: solution.log.len(),
            limit: MAX_OPERATIONS,
        });
    }

    let mut replay = Replay::new(problem);
    for (index, op) in solution.log.iter().enumerate() {
        match *op {
            Operation::Reload {
                len,
                directory_offset,
                buffer_offset,
            } => {
                if len == 0 {
                    return Err(JudgeError::EmptyReload { index });
                }
                if exceeds(directory_offset, len, problem.capacity_a)
                    || exceeds(buffer_offset, len, problem.capacity_b)
                {
                    return Err(JudgeError::ReloadOutOfBounds {
                        index,
                        len,
                        directory_offset,
                        buffer_offset,
                        capacity_a: problem.capacity_a,
                        capacity_b: problem.capacity_b,
                    });
                }
                replay.reload(directory, len, directory_offset, buffer_offset);
            }
            Operation::Step(to) => {
                if to >= node_count {
                    return Err(JudgeError::NodeOutOfRange {
                        index,
                        node: to,
                        node_count,
                    });
                }
                if replay.held[to] == 0 {
                    return Err(JudgeError::NotInBuffer { index, node: to });
                }
                if !graph.is_adjacent(replay.current, to) {
                    return Err(JudgeError::NotAdjacent {
                        index,
                        from: replay.current,
                        to,
                    });
                }
                replay.step(to);
            }
        }
    }

    if replay.next_target < problem.order.len() {
        return Err(JudgeError::TargetsRemaining {
            visited: replay.next_target,
            total: problem.order.len(),
        });
    }

    let report = JudgeReport {
        score: solution.log.reloads(),
        operations: solution.log.len(),
        steps: solution.log.steps(),
        targets_visited: replay.next_target,
    };
    debug!(score = report.score, operations = report.operations, "solution accepted");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationLog;

    fn problem() -> Problem {
        Problem::parse("5 4 3 6 3\n0 1\n1 2\n2 3\n3 4\n2 4 0\n").unwrap()
    }

    fn solution(ops: &str) -> Solution {
        Solution::parse(&format!("0 1 2 3 4 0\n{}", ops), &problem()).unwrap()
    }

    #[test]
    fn test_accepts_valid_replay() {
        let sol = solution("s 3 0 0\nm 1\nm 2\ns 2 3 0\nm 3\nm 4\nm 3\ns 3 0 0\nm 2\nm 1\nm 0\n");
        let report = judge(&problem(), &sol).unwrap();
        assert_eq!(
            report,
            JudgeReport {
                score: 3,
                operations: 11,
                steps: 8,
                targets_visited: 3
            }
        );
    }

    #[test]
    fn test_leftover_buffer_slots_stay_enterable() {
        // reloading [3,4] into slots 0..2 leaves node 2 in slot 2
        let sol = solution("s 3 0 0\nm 1\nm 2\ns 2 3 0\nm 3\nm 4\nm 3\nm 2\ns 2 0 0\nm 1\nm 0\n");
        assert_eq!(judge(&problem(), &sol).unwrap().score, 3);
    }

    #[test]
    fn test_rejects_step_outside_buffer() {
        let sol = solution("s 2 0 0\nm 1\nm 2\n");
        assert_eq!(
            judge(&problem(), &sol),
            Err(JudgeError::NotInBuffer { index: 2, node: 2 })
        );
    }

    #[test]
    fn test_rejects_non_adjacent_step() {
        let sol = solution("s 3 0 0\nm 2\n");
        assert_eq!(
            judge(&problem(), &sol),
            Err(JudgeError::NotAdjacent {
                index: 1,
                from: 0,
                to: 2
            })
        );
    }

    #[test]
    fn test_rejects_reload_past_buffer() {
        let sol = solution("s 3 0 1\n");
        assert!(matches!(
            judge(&problem(), &sol),
            Err(JudgeError::ReloadOutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_reload_offset() {
        let sol = solution(&format!("s 1 {} 0\n", usize::MAX));
        assert_eq!(
            judge(&problem(), &sol),
            Err(JudgeError::ReloadOutOfBounds {
                index: 0,
                len: 1,
                directory_offset: usize::MAX,
                buffer_offset: 0,
                capacity_a: 6,
                capacity_b: 3,
            })
        );

        let sol = solution(&format!("s 1 0 {}\n", usize::MAX));
        assert!(matches!(
            judge(&problem(), &sol),
            Err(JudgeError::ReloadOutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_start_node_is_not_a_visit() {
        // built directly: the parser refuses a first target on the start node
        let mut problem = problem();
        problem.order = vec![0, 1];
        let sol = solution("s 3 0 0\nm 1\n");
        assert_eq!(
            judge(&problem, &sol),
            Err(JudgeError::TargetsRemaining {
                visited: 0,
                total: 2
            })
        );
    }

    #[test]
    fn test_one_target_per_step() {
        let mut problem = problem();
        problem.order = vec![1, 1];
        assert_eq!(
            judge(&problem, &solution("s 3 0 0\nm 1\n")),
            Err(JudgeError::TargetsRemaining {
                visited: 1,
                total: 2
            })
        );
        assert_eq!(
            judge(&problem, &solution("s 3 0 0\nm 1\nm 0\nm 1\n"))
                .unwrap()
                .targets_visited,
            2
        );
    }

    #[test]
    fn test_rejects_missing_targets() {
        let sol = solution("s 3 0 0\nm 1\nm 2\n");
        assert_eq!(
            judge(&problem(), &sol),
            Err(JudgeError::TargetsRemaining {
                visited: 1,
                total: 3
            })
        );
    }

    #[test]
    fn test_rejects_bad_directory() {
        let sol = Solution {
            directory: vec![0, 1, 2, 3, 9, 0],
            log: OperationLog::new(),
        };
        assert_eq!(
            judge(&problem(), &sol),
            Err(JudgeError::DirectoryNode {
                index: 4,
                node: 9,
                node_count: 5
            })
        );
    }

    #[test]
    fn test_rejects_too_many_operations() {
        let sol = Solution {
            directory: vec![0; 6],
            log: std::iter::repeat(Operation::Step(1))
                .take(MAX_OPERATIONS + 1)
                .collect(),
        };
        assert!(matches!(
            judge(&problem(), &sol),
            Err(JudgeError::TooManyOperations { .. })
        ));
    }
}
