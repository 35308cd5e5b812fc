//! Wall-clock budget shared by the search loop and its evaluations.

use std::time::{Duration, Instant};

/// A start instant plus a time budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline starting now
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Deadline that never expires in practice
    pub fn unbounded() -> Self {
        Self::new(Duration::MAX)
    }

    /// Same start, budget shortened by `reserve`
    pub fn reserving(&self, reserve: Duration) -> Self {
        Self {
            start: self.start,
            budget: self.budget.saturating_sub(reserve),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }
}
