//! rowpulse - concurrent point-lookup benchmark
//!
//! rowpulse measures how fast a database answers primary-key lookups when
//! `P` workers issue `N` of them in parallel, optionally with keys drawn from
//! a skewed distribution.
//!
//! # Architecture
//!
//! - **Backends**: SQLite connection pool, plus an in-process mock for tests
//! - **Iterations**: shared-handle lookup or fresh session per iteration
//! - **Key distributions**: fixed, uniform, Zipf (seeded, reproducible)
//! - **Worker pool**: pre-filled work queue, first failure wins
//! - **Timing**: untimed warm-up, then wall-clock time over the whole pool

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod iteration;
pub mod output;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use backend::Backend;
pub use config::BenchConfig;
pub use stats::RunResult;

/// Result type used throughout rowpulse
pub type Result<T> = anyhow::Result<T>;
