//! Worker pool implementation
//!
//! This module implements the pool of `P` OS threads that drain a
//! [`WorkQueue`], calling the caller's [`Iteration`] once per token.
//!
//! # Architecture
//!
//! - **WorkQueue**: pre-filled, closed set of tokens; pulls never block
//! - **FailureCell**: first error wins; every worker checks it before pulling
//! - **Iteration**: the measured operation, borrowed by all workers at once
//!
//! Workers run on scoped threads so they can borrow the queue, the iteration
//! and the shared connection handle directly. [`WorkerPool::run`] joins every
//! worker before it returns.
//!
//! # Failure Semantics
//!
//! When an iteration fails, its worker records the error and stops. The other
//! workers finish whatever iteration they are in, see the recorded failure on
//! their next pull and stop too. Nothing is cancelled or retried. The pool
//! then returns the recorded error, never a partial report.
//!
//! # Example
//!
//! ```
//! use rowpulse::worker::{WorkerPool, queue::WorkQueue};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let count = AtomicUsize::new(0);
//! let queue = WorkQueue::fill(100, None)?;
//! let pool = WorkerPool::new(4)?;
//!
//! let op = |_key: Option<u64>| -> rowpulse::Result<()> {
//!     count.fetch_add(1, Ordering::Relaxed);
//!     Ok(())
//! };
//! let report = pool.run(&queue, &op)?;
//!
//! assert_eq!(report.dispatched, 100);
//! assert_eq!(count.load(Ordering::Relaxed), 100);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod failure;
pub mod queue;

use crate::iteration::Iteration;
use crate::Result;
use failure::FailureCell;
use queue::WorkQueue;
use std::thread;
use tracing::{debug, warn};

/// What a successful pool run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    /// Tokens taken from the queue across all workers
    pub dispatched: u64,

    /// Tokens taken by each worker, indexed by worker id
    pub per_worker: Vec<u64>,
}

/// Fixed-size pool of parallel workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool of `workers` threads (at least 1)
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            anyhow::bail!("worker pool needs at least one worker");
        }
        Ok(Self { workers })
    }

    /// Drain `queue` with all workers, one `iteration` call per token
    ///
    /// Returns after every worker has joined. On failure the first recorded
    /// error is returned.
    pub fn run(&self, queue: &WorkQueue, iteration: &dyn Iteration) -> Result<PoolReport> {
        self.run_with(queue, iteration, |id| {
            thread::Builder::new().name(format!("rowpulse-worker-{}", id))
        })
    }

    /// [`WorkerPool::run`] with the thread builder for each worker supplied by `builder`
    fn run_with<B>(
        &self,
        queue: &WorkQueue,
        iteration: &dyn Iteration,
        builder: B,
    ) -> Result<PoolReport>
    where
        B: Fn(usize) -> thread::Builder,
    {
        let failure = FailureCell::new();

        let joined: Vec<thread::Result<u64>> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let failure = &failure;
                let spawned = builder(id)
                    .spawn_scoped(scope, move || worker_loop(id, queue, iteration, failure));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        // Workers already running stop at their next pull and are joined below
                        failure.record(
                            anyhow::Error::new(err).context("Failed to spawn worker thread"),
                        );
                        break;
                    }
                }
            }

            handles.into_iter().map(|handle| handle.join()).collect()
        });

        let mut per_worker = Vec::with_capacity(joined.len());
        let mut panicked = false;
        for result in joined {
            match result {
                Ok(consumed) => per_worker.push(consumed),
                Err(_) => {
                    panicked = true;
                    per_worker.push(0);
                }
            }
        }

        if panicked {
            failure.record(anyhow::anyhow!("Worker thread panicked"));
        }

        if failure.is_set() {
            warn!(
                undispatched = queue.remaining(),
                requested = queue.capacity(),
                "run aborted; not every iteration was executed"
            );
        }
        failure.into_result()?;

        let dispatched = per_worker.iter().sum();
        Ok(PoolReport { dispatched, per_worker })
    }
}

/// Pull tokens until the queue is exhausted or any worker has failed
fn worker_loop(
    id: usize,
    queue: &WorkQueue,
    iteration: &dyn Iteration,
    failure: &FailureCell,
) -> u64 {
    let mut consumed = 0u64;

    while !failure.is_set() {
        let Some(token) = queue.next() else {
            break;
        };
        consumed += 1;

        if let Err(err) = iteration.run(token.key) {
            warn!(worker = id, seq = token.seq, error = %err, "iteration failed");
            failure.record(err);
            break;
        }
    }

    debug!(worker = id, consumed, "worker finished");
    consumed
}
