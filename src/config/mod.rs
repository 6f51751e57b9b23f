//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! A [`BenchConfig`] is built once at startup and handed to the engine by
//! reference; nothing in the engine reads process-wide settings.

pub mod cli;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default Zipf skew exponent
pub const DEFAULT_ZIPF_S: f64 = 1.5;

/// Default Zipf taper
pub const DEFAULT_ZIPF_V: f64 = 8.0;

/// Complete benchmark configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Database connection and schema bootstrap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, or `:memory:` for a shared in-memory database
    #[serde(default = "default_dsn")]
    pub dsn: String,
    /// Connections behind the shared handle
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// SQLite busy timeout in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Rows written by schema bootstrap (ids 1..=rows)
    #[serde(default = "default_rows")]
    pub rows: u64,
    /// Rows per bootstrap transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

/// DSN of a private SQLite database that lives only as long as the process
pub const MEMORY_DSN: &str = ":memory:";

fn default_dsn() -> String {
    MEMORY_DSN.to_string()
}

fn default_pool_size() -> usize {
    num_cpus::get().max(1)
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_rows() -> u64 {
    1000
}

fn default_batch_size() -> u64 {
    100_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            rows: default_rows(),
            batch_size: default_batch_size(),
        }
    }
}

/// Workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Total iterations N
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Concurrent workers P
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    /// Reads per iteration in the isolated-session variant
    #[serde(default = "default_ops")]
    pub ops: usize,
    /// Shared handle or one fresh session per iteration
    #[serde(default)]
    pub session: SessionMode,
    /// Name every shared-session lookup must return, if set
    #[serde(default)]
    pub expect_name: Option<String>,
}

fn default_iterations() -> usize {
    1000
}

fn default_parallel() -> usize {
    1
}

fn default_ops() -> usize {
    1
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            parallel: default_parallel(),
            ops: default_ops(),
            session: SessionMode::default(),
            expect_name: None,
        }
    }
}

/// How iterations reach the database
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionMode {
    /// All workers share the already-open handle
    #[default]
    Shared,
    /// Each iteration opens, seeds, queries and drops its own session
    Isolated,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Shared => write!(f, "shared"),
            SessionMode::Isolated => write!(f, "isolated"),
        }
    }
}

/// Key sampling configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default)]
    pub distribution: KeyDistribution,
    /// RNG seed; runs with the same seed draw the same keys
    #[serde(default)]
    pub seed: u64,
}

/// Key distribution
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub enum KeyDistribution {
    /// Always key 1
    #[default]
    Fixed,
    Uniform { universe: u64 },
    Zipf { s: f64, v: f64, universe: u64 },
}

impl KeyDistribution {
    /// Number of keys the distribution draws from, if it samples at all
    pub fn universe(&self) -> Option<u64> {
        match self {
            KeyDistribution::Fixed => None,
            KeyDistribution::Uniform { universe } => Some(*universe),
            KeyDistribution::Zipf { universe, .. } => Some(*universe),
        }
    }
}

impl fmt::Display for KeyDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyDistribution::Fixed => write!(f, "fixed (key=1)"),
            KeyDistribution::Uniform { universe } => write!(f, "uniform (M={})", universe),
            KeyDistribution::Zipf { s, v, universe } => {
                write!(f, "zipf (s={}, v={}, M={})", s, v, universe)
            }
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON result file path
    pub json_output: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Run schema bootstrap and exit instead of benchmarking
    #[serde(default)]
    pub initialize: bool,
    /// Validate and print the configuration without running anything
    #[serde(default)]
    pub dry_run: bool,
    /// Verbose diagnostics
    #[serde(default)]
    pub debug: bool,
}
