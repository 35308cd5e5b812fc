//! Agent operations and the running operation log.

use crate::graph::NodeId;
use serde::Serialize;
use std::fmt;

/// One emitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Copy `len` directory entries starting at `directory_offset` into the
    /// buffer at `buffer_offset`. Each reload costs one point.
    Reload {
        len: usize,
        directory_offset: usize,
        buffer_offset: usize,
    },
    /// Move across one edge to the given node. Free.
    Step(NodeId),
}

impl Operation {
    pub fn is_reload(&self) -> bool {
        matches!(self, Operation::Reload { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Reload {
                len,
                directory_offset,
                buffer_offset,
            } => write!(f, "s {} {} {}", len, directory_offset, buffer_offset),
            Operation::Step(node) => write!(f, "m {}", node),
        }
    }
}

/// Append-only operation sequence with a running reload count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLog {
    ops: Vec<Operation>,
    reloads: usize,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operation) {
        if op.is_reload() {
            self.reloads += 1;
        }
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Number of reloads, i.e. the score
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    pub fn steps(&self) -> usize {
        self.ops.len() - self.reloads
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.reloads = 0;
    }
}

impl Extend<Operation> for OperationLog {
    fn extend<I: IntoIterator<Item = Operation>>(&mut self, iter: I) {
        for op in iter {
            self.push(op);
        }
    }
}

impl FromIterator<Operation> for OperationLog {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut log = Self::new();
        log.extend(iter);
        log
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
