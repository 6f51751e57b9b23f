//! Benchmark coordinator
//!
//! Drives one complete run: build the key sampler, prime the connection,
//! time the fill and drain of the work queue, and turn the result into a
//! [`RunResult`].
//!
//! # Run Phases
//!
//! 1. **Configuration**: reject `N == 0`, `P == 0` and invalid sampler
//!    parameters before any work starts
//! 2. **Primer**: one untimed iteration with key 1; its error aborts the run
//! 3. **Timed phase**: start the clock, create all `N` tokens (drawing keys
//!    from the sampler), run the pool, stop the clock once every worker has
//!    joined
//!
//! Key draws happen inside the timed phase, so a skewed run includes the
//! sampler's cost in its elapsed time.

use crate::backend::Backend;
use crate::config::{BenchConfig, SamplerConfig, WorkloadConfig};
use crate::distribution::{create_distribution, Distribution};
use crate::iteration::{build_iteration, Iteration};
use crate::stats::RunResult;
use crate::util::time::{format_duration, Timestamp};
use crate::worker::queue::WorkQueue;
use crate::worker::{PoolReport, WorkerPool};
use crate::Result;
use anyhow::Context;
use std::time::Duration;
use tracing::{debug, info};

/// Run the benchmark described by `config` against an already-open backend
///
/// The iteration variant (shared lookup or isolated session) is picked from
/// `config.workload.session`.
pub fn run_benchmark(config: &BenchConfig, backend: &dyn Backend) -> Result<RunResult> {
    info!(
        backend = backend.name(),
        iterations = config.workload.iterations,
        parallel = config.workload.parallel,
        session = %config.workload.session,
        distribution = %config.sampler.distribution,
        "starting benchmark"
    );

    let iteration = build_iteration(backend, &config.workload);
    execute(&config.workload, &config.sampler, iteration.as_ref())
}

/// Run `workload.iterations` calls of `iteration` on `workload.parallel` workers
///
/// Returns the timing only when every iteration succeeded; otherwise the
/// first recorded error.
pub fn execute(
    workload: &WorkloadConfig,
    sampler: &SamplerConfig,
    iteration: &dyn Iteration,
) -> Result<RunResult> {
    let n = workload.iterations;
    let p = workload.parallel;

    if n == 0 {
        anyhow::bail!("iterations must be at least 1");
    }
    let pool = WorkerPool::new(p).context("parallel must be at least 1")?;
    let mut dist = create_distribution(sampler).context("Invalid key distribution")?;

    let primer = Timestamp::now();
    iteration.run(None).context("Warm-up iteration failed")?;
    debug!(took = %format_duration(primer.elapsed()), "warm-up iteration done");

    let (report, elapsed) = timed_phase(&pool, n, dist.as_deref_mut(), iteration)?;

    if report.dispatched != n as u64 {
        anyhow::bail!(
            "dispatched {} iterations but {} were requested",
            report.dispatched,
            n
        );
    }

    let result = RunResult::new(n as u64, p, elapsed, report.per_worker);
    info!(
        elapsed = %format_duration(result.elapsed),
        mean = %format_duration(result.mean_per_iteration),
        "benchmark complete"
    );
    Ok(result)
}

/// Fill the queue and drain it, timed from before the fill to after the last join
fn timed_phase(
    pool: &WorkerPool,
    n: usize,
    sampler: Option<&mut (dyn Distribution + '_)>,
    iteration: &dyn Iteration,
) -> Result<(PoolReport, Duration)> {
    let start = Timestamp::now();

    let queue = WorkQueue::fill(n, sampler)?;
    debug!(tokens = queue.capacity(), "work queue filled");

    let report = pool.run(&queue, iteration)?;
    Ok((report, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::sqlite::SqliteBackend;
    use crate::config::{DatabaseConfig, KeyDistribution, SessionMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn workload(iterations: usize, parallel: usize) -> WorkloadConfig {
        WorkloadConfig {
            iterations,
            parallel,
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn test_execute_counts_primer_plus_n() {
        for &(n, p) in &[(1, 1), (10, 3), (100, 4), (5, 16)] {
            let count = AtomicUsize::new(0);
            let op = |_key: Option<u64>| -> Result<()> {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            };

            let result = execute(&workload(n, p), &SamplerConfig::default(), &op).unwrap();

            // The primer is one extra, untimed call
            assert_eq!(count.load(Ordering::SeqCst), n + 1);
            assert_eq!(result.iterations, n as u64);
            assert_eq!(result.per_worker.iter().sum::<u64>(), n as u64);
        }
    }

    #[test]
    fn test_execute_rejects_zero_counts() {
        let op = |_key: Option<u64>| -> Result<()> { Ok(()) };
        assert!(execute(&workload(0, 1), &SamplerConfig::default(), &op).is_err());
        assert!(execute(&workload(1, 0), &SamplerConfig::default(), &op).is_err());
    }

    #[test]
    fn test_invalid_sampler_fails_before_primer() {
        let count = AtomicUsize::new(0);
        let op = |_key: Option<u64>| -> Result<()> {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        let sampler = SamplerConfig {
            distribution: KeyDistribution::Zipf { s: 1.0, v: 8.0, universe: 10 },
            seed: 0,
        };

        assert!(execute(&workload(10, 2), &sampler, &op).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mean_is_elapsed_over_n() {
        let op = |_key: Option<u64>| -> Result<()> {
            std::thread::sleep(Duration::from_millis(10));
            Ok(())
        };

        let result = execute(&workload(20, 4), &SamplerConfig::default(), &op).unwrap();

        // 20 x 10ms over 4 workers
        assert!(result.elapsed >= Duration::from_millis(50));
        assert!(result.elapsed < Duration::from_millis(400), "elapsed {:?}", result.elapsed);
        assert_eq!(
            result.mean_per_iteration.as_nanos(),
            result.elapsed.as_nanos() / 20
        );
    }

    #[test]
    fn test_key_draws_are_timed() {
        struct SlowSampler;
        impl Distribution for SlowSampler {
            fn next_key(&mut self) -> u64 {
                std::thread::sleep(Duration::from_millis(2));
                1
            }
        }

        let op = |_key: Option<u64>| -> Result<()> { Ok(()) };
        let pool = WorkerPool::new(2).unwrap();

        let mut sampler = SlowSampler;
        let (report, elapsed) = timed_phase(&pool, 10, Some(&mut sampler), &op).unwrap();

        assert_eq!(report.dispatched, 10);
        assert!(elapsed >= Duration::from_millis(20), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_warm_up_failure_aborts_run() {
        let backend = MockBackend::new().with_row(1, "jane");
        backend.set_should_fail(true);

        let config = BenchConfig {
            workload: workload(10, 2),
            ..BenchConfig::default()
        };
        let err = run_benchmark(&config, &backend).unwrap_err();

        assert_eq!(err.to_string(), "Warm-up iteration failed");
        assert_eq!(backend.lookup_count(), 1);
    }

    #[test]
    fn test_iteration_failure_returns_error() {
        let backend = MockBackend::new().with_row(1, "jane");
        // Call 1 is the primer
        backend.set_fail_on_lookup(Some(10));

        let config = BenchConfig {
            workload: workload(50, 4),
            ..BenchConfig::default()
        };
        let err = run_benchmark(&config, &backend).unwrap_err();

        assert_eq!(err.to_string(), "mock lookup 10 failed");
    }

    #[test]
    fn test_missing_row_is_iteration_error() {
        let backend = MockBackend::new();
        backend.initialize(10, 100).unwrap();

        // Universe larger than the seeded rows: high keys miss
        let config = BenchConfig {
            workload: workload(500, 2),
            sampler: SamplerConfig {
                distribution: KeyDistribution::Uniform { universe: 1000 },
                seed: 7,
            },
            ..BenchConfig::default()
        };
        let err = run_benchmark(&config, &backend).unwrap_err();
        assert!(err.to_string().starts_with("no row with id"), "{}", err);
    }

    #[test]
    fn test_zipf_run_against_mock() {
        let backend = MockBackend::new();
        backend.initialize(100, 100).unwrap();

        let config = BenchConfig {
            workload: workload(1000, 4),
            sampler: SamplerConfig {
                distribution: KeyDistribution::Zipf { s: 1.5, v: 8.0, universe: 100 },
                seed: 0,
            },
            ..BenchConfig::default()
        };
        let result = run_benchmark(&config, &backend).unwrap();

        assert_eq!(result.iterations, 1000);
        assert_eq!(backend.lookup_count(), 1001);
    }

    #[test]
    fn test_isolated_sessions_per_token() {
        let backend = MockBackend::new();
        let config = BenchConfig {
            workload: WorkloadConfig {
                iterations: 10,
                parallel: 3,
                ops: 5,
                session: SessionMode::Isolated,
                expect_name: None,
            },
            ..BenchConfig::default()
        };

        run_benchmark(&config, &backend).unwrap();

        // 10 tokens plus the primer, each on its own session
        assert_eq!(backend.sessions_opened(), 11);
        assert_eq!(backend.create_count(), 11);
        assert_eq!(backend.insert_count(), 11);
        assert_eq!(backend.session_read_count(), 55);
        assert_eq!(backend.sessions_live(), 0);
        assert_eq!(backend.lookup_count(), 0);
    }

    #[test]
    fn test_end_to_end_sqlite_shared_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.db");

        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
                 INSERT INTO t (id, name) VALUES (1, 'jane');",
            )
            .unwrap();
        }

        let backend = SqliteBackend::open(&DatabaseConfig {
            dsn: path.to_string_lossy().into_owned(),
            pool_size: 4,
            ..DatabaseConfig::default()
        })
        .unwrap();

        let count = AtomicUsize::new(0);
        let lookup = crate::iteration::SharedLookup::new(&backend).expecting("jane");
        let op = |key: Option<u64>| -> Result<()> {
            lookup.run(key)?;
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let result = execute(&workload(100, 4), &SamplerConfig::default(), &op).unwrap();

        assert_eq!(result.iterations, 100);
        assert_eq!(count.load(Ordering::SeqCst), 101);
    }

    #[test]
    fn test_end_to_end_sqlite_isolated_sessions() {
        let backend = SqliteBackend::open(&DatabaseConfig {
            pool_size: 2,
            ..DatabaseConfig::default()
        })
        .unwrap();

        let config = BenchConfig {
            workload: WorkloadConfig {
                iterations: 20,
                parallel: 4,
                ops: 5,
                session: SessionMode::Isolated,
                expect_name: None,
            },
            ..BenchConfig::default()
        };

        let result = run_benchmark(&config, &backend).unwrap();
        assert_eq!(result.per_worker.len(), 4);
    }
}
