//! Problem input parsing.
//!
//! The text format is whitespace separated:
//!
//! ```text
//! N M T LA LB
//! u v            (M edges)
//! t ...          (T targets)
//! x y            (N coordinates, optional)
//! ```
//!
//! Every target must move the agent: the first target differs from the
//! start node and no target repeats the one before it.

use crate::graph::{Graph, GraphError, NodeId, START_NODE};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading a problem
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProblemError {
    #[error("unexpected end of input while reading {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("cannot parse {token:?} as {expected}")]
    Parse { token: String, expected: &'static str },

    #[error("{what} = {value} is out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        value: usize,
        limit: usize,
    },

    #[error("target 0 is the start node {node}")]
    TargetAtStart { node: NodeId },

    #[error("target {index} repeats the previous target {node}")]
    RepeatedTarget { index: usize, node: NodeId },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A routing instance: graph, visitation order and capacities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub node_count: usize,
    pub edges: Vec<(NodeId, NodeId)>,
    /// Nodes to visit in order, starting from [`START_NODE`]
    pub order: Vec<NodeId>,
    /// Directory length (`LA`)
    pub capacity_a: usize,
    /// Buffer length (`LB`)
    pub capacity_b: usize,
    /// Drawing coordinates, empty when the input omits them
    pub coordinates: Vec<(i64, i64)>,
}

/// Summary figures for a problem
#[derive(Debug, Clone, Serialize)]
pub struct ProblemStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub target_count: usize,
    pub capacity_a: usize,
    pub capacity_b: usize,
    pub max_degree: usize,
    pub mean_degree: f64,
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next_raw(&mut self, expected: &'static str) -> Result<&'a str, ProblemError> {
        self.inner
            .next()
            .ok_or(ProblemError::UnexpectedEof { expected })
    }

    fn next<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ProblemError> {
        let token = self.next_raw(expected)?;
        token.parse().map_err(|_| ProblemError::Parse {
            token: token.to_string(),
            expected,
        })
    }

    fn next_node(&mut self, expected: &'static str, node_count: usize) -> Result<NodeId, ProblemError> {
        let value: usize = self.next(expected)?;
        if value >= node_count {
            return Err(ProblemError::OutOfRange {
                what: expected,
                value,
                limit: node_count,
            });
        }
        Ok(value)
    }

    fn is_empty(&self) -> bool {
        self.inner.clone().next().is_none()
    }
}

impl Problem {
    pub fn parse(text: &str) -> Result<Self, ProblemError> {
        let mut tokens = Tokens {
            inner: text.split_whitespace(),
        };

        let node_count: usize = tokens.next("N")?;
        let edge_count: usize = tokens.next("M")?;
        let target_count: usize = tokens.next("T")?;
        let capacity_a: usize = tokens.next("LA")?;
        let capacity_b: usize = tokens.next("LB")?;

        if node_count == 0 {
            return Err(ProblemError::OutOfRange {
                what: "N",
                value: 0,
                limit: 1,
            });
        }
        if edge_count + 1 < node_count {
            return Err(ProblemError::OutOfRange {
                what: "M",
                value: edge_count,
                limit: node_count - 1,
            });
        }
        if capacity_b == 0 || capacity_b > capacity_a {
            return Err(ProblemError::OutOfRange {
                what: "LB",
                value: capacity_b,
                limit: capacity_a,
            });
        }

        let mut edges = Vec::with_capacity(edge_count);
        for _ in 0..edge_count {
            let u = tokens.next_node("edge endpoint", node_count)?;
            let v = tokens.next_node("edge endpoint", node_count)?;
            edges.push((u, v));
        }

        let mut order = Vec::with_capacity(target_count);
        let mut previous = START_NODE;
        for index in 0..target_count {
            let node = tokens.next_node("target", node_count)?;
            if node == previous {
                return Err(if index == 0 {
                    ProblemError::TargetAtStart { node }
                } else {
                    ProblemError::RepeatedTarget { index, node }
                });
            }
            order.push(node);
            previous = node;
        }

        let mut coordinates = Vec::new();
        if !tokens.is_empty() {
            coordinates.reserve(node_count);
            for _ in 0..node_count {
                let x: i64 = tokens.next("x coordinate")?;
                let y: i64 = tokens.next("y coordinate")?;
                coordinates.push((x, y));
            }
        }

        Ok(Self {
            node_count,
            edges,
            order,
            capacity_a,
            capacity_b,
            coordinates,
        })
    }

    pub fn graph(&self) -> Result<Graph, GraphError> {
        Graph::from_edges(self.node_count, &self.edges)
    }

    /// The visitation sequence including the start node
    pub fn route(&self) -> Vec<NodeId> {
        std::iter::once(START_NODE)
            .chain(self.order.iter().copied())
            .collect()
    }

    pub fn stats(&self) -> Result<ProblemStats, GraphError> {
        let graph = self.graph()?;
        let max_degree = (0..self.node_count)
            .map(|v| graph.degree(v))
            .max()
            .unwrap_or(0);
        Ok(ProblemStats {
            node_count: self.node_count,
            edge_count: graph.edge_count(),
            target_count: self.order.len(),
            capacity_a: self.capacity_a,
            capacity_b: self.capacity_b,
            max_degree,
            mean_degree: 2.0 * graph.edge_count() as f64 / self.node_count as f64,
        })
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} {} {}",
            self.node_count,
            self.edges.len(),
            self.order.len(),
            self.capacity_a,
            self.capacity_b
        )?;
        for (u, v) in &self.edges {
            writeln!(f, "{} {}", u, v)?;
        }
        let targets: Vec<String> = self.order.iter().map(|t| t.to_string()).collect();
        writeln!(f, "{}", targets.join(" "))?;
        for (x, y) in &self.coordinates {
            writeln!(f, "{} {}", x, y)?;
        }
        Ok(())
    }
}

impl FromStr for Problem {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
