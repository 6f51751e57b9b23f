//! Run results
//!
//! A run either fails as a whole or produces one [`RunResult`]. There is no
//! partial result: if any iteration failed, the caller only sees the error.

use crate::util::time::{calculate_rate, mean_per_iteration};
use std::time::Duration;

/// Timing of one successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Requested iteration count `N`
    pub iterations: u64,

    /// Worker count `P`
    pub parallel: usize,

    /// Wall-clock time from just before the first worker started to just
    /// after the last one joined
    pub elapsed: Duration,

    /// `elapsed / N`, truncated to whole nanoseconds
    pub mean_per_iteration: Duration,

    /// Tokens consumed by each worker
    pub per_worker: Vec<u64>,
}

impl RunResult {
    pub fn new(iterations: u64, parallel: usize, elapsed: Duration, per_worker: Vec<u64>) -> Self {
        Self {
            iterations,
            parallel,
            elapsed,
            mean_per_iteration: mean_per_iteration(elapsed, iterations),
            per_worker,
        }
    }

    /// Iterations per second over the timed phase
    pub fn iterations_per_sec(&self) -> f64 {
        calculate_rate(self.iterations, self.elapsed)
    }
}
