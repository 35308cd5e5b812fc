//! Solution output: the directory line followed by one operation per line.

use crate::field::Field;
use crate::graph::NodeId;
use crate::operation::{Operation, OperationLog};
use crate::problem::Problem;
use std::fmt;
use thiserror::Error;

/// Errors raised while reading a solution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolutionError {
    #[error("output has no directory line")]
    MissingDirectory,

    #[error("line {line}: directory has {found} entries, expected {expected}")]
    DirectoryLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Directory contents plus the operation log that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub directory: Vec<NodeId>,
    pub log: OperationLog,
}

impl Solution {
    /// Snapshot the padded directory and committed log of `field`.
    pub fn from_field(field: &Field) -> Self {
        Self {
            directory: field.directory(),
            log: field.log().clone(),
        }
    }

    /// Number of reloads in the log
    pub fn score(&self) -> usize {
        self.log.reloads()
    }

    /// Read a solution in output format. Blank lines and lines starting
    /// with `#` are skipped.
    pub fn parse(text: &str, problem: &Problem) -> Result<Self, SolutionError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (line, first) = lines.next().ok_or(SolutionError::MissingDirectory)?;
        let directory = first
            .split_whitespace()
            .map(|t| parse_usize(t, line, "directory entry"))
            .collect::<Result<Vec<_>, _>>()?;
        if directory.len() != problem.capacity_a {
            return Err(SolutionError::DirectoryLength {
                line,
                expected: problem.capacity_a,
                found: directory.len(),
            });
        }

        let mut log = OperationLog::new();
        for (line, text) in lines {
            log.push(parse_operation(text, line)?);
        }

        Ok(Self { directory, log })
    }
}

fn parse_usize(token: &str, line: usize, what: &str) -> Result<usize, SolutionError> {
    token.parse().map_err(|_| SolutionError::Malformed {
        line,
        message: format!("cannot parse {:?} as {}", token, what),
    })
}

fn parse_operation(text: &str, line: usize) -> Result<Operation, SolutionError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let malformed = |message: &str| SolutionError::Malformed {
        line,
        message: message.to_string(),
    };

    match tokens.as_slice() {
        ["s", len, pa, pb] => {
            let len = parse_usize(len, line, "reload length")?;
            if len == 0 {
                return Err(malformed("reload length must be at least 1"));
            }
            Ok(Operation::Reload {
                len,
                directory_offset: parse_usize(pa, line, "directory offset")?,
                buffer_offset: parse_usize(pb, line, "buffer offset")?,
            })
        }
        ["m", v] => Ok(Operation::Step(parse_usize(v, line, "node")?)),
        ["s", ..] => Err(malformed("operation s must be like 's len pa pb'")),
        ["m", ..] => Err(malformed("operation m must be like 'm v'")),
        [other, ..] => Err(malformed(&format!("unknown operation {:?}", other))),
        [] => Err(malformed("empty operation")),
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.directory {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", node)?;
            first = false;
        }
        writeln!(f)?;
        for op in &self.log {
            writeln!(f, "{}", op)?;
        }
        Ok(())
    }
}
