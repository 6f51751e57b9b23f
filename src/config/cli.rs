//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// rowpulse - point-lookup latency benchmark
#[derive(Parser, Debug)]
#[command(name = "rowpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database path, or `:memory:` (default)
    #[arg(value_name = "DSN")]
    pub dsn: Option<String>,

    /// Initialize schema & exit
    #[arg(long)]
    pub init: bool,

    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Workload Options ===
    /// Iterations [default: 1000]
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Parallel workers [default: 1]
    #[arg(short = 'p', long)]
    pub parallel: Option<usize>,

    /// Reads per iteration in isolated-session mode [default: 1]
    #[arg(long)]
    pub ops: Option<usize>,

    /// Reuse one shared handle, or open a fresh session per iteration [default: shared]
    #[arg(long, value_enum)]
    pub session: Option<SessionKind>,

    /// Fail any shared-session lookup that does not return this name
    #[arg(long)]
    pub expect_name: Option<String>,

    // === Key Distribution Options ===
    /// Key distribution [default: fixed]
    #[arg(long, value_enum)]
    pub distribution: Option<DistributionKind>,

    /// Zipf skew exponent, must be > 1.0 [default: 1.5]
    #[arg(long)]
    pub zipf_s: Option<f64>,

    /// Zipf taper, must be >= 1.0 [default: 8.0]
    #[arg(long)]
    pub zipf_v: Option<f64>,

    /// Number of keys to draw from [default: --rows]
    #[arg(long)]
    pub universe: Option<u64>,

    /// Sampler seed [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    // === Database Options ===
    /// Rows written by --init (ids 1..=rows) [default: 1000]
    #[arg(long)]
    pub rows: Option<u64>,

    /// Rows per transaction during --init [default: 100000]
    #[arg(long)]
    pub batch_size: Option<u64>,

    /// Connections behind the shared handle [default: number of CPUs]
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// SQLite busy timeout in milliseconds [default: 5000]
    #[arg(long)]
    pub busy_timeout_ms: Option<u64>,

    // === Output Options ===
    /// Write the run result as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Validate and print the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionKind {
    /// All workers share one handle
    Shared,
    /// Each iteration opens and tears down its own session
    Isolated,
}

/// Key distribution type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DistributionKind {
    /// Always key 1
    Fixed,
    /// Equal probability over [1, M]
    Uniform,
    /// Power law over [1, M]
    Zipf,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    ///
    /// Only catches what clap cannot; the merged configuration is checked
    /// again by [`crate::config::validator::validate_config`].
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.iterations == Some(0) {
            anyhow::bail!("iterations must be at least 1");
        }
        if self.parallel == Some(0) {
            anyhow::bail!("parallel must be at least 1");
        }
        if self.ops == Some(0) {
            anyhow::bail!("ops must be at least 1");
        }

        let zipf_flags = self.zipf_s.is_some() || self.zipf_v.is_some();
        let non_zipf = matches!(
            self.distribution,
            Some(DistributionKind::Fixed | DistributionKind::Uniform)
        );
        if zipf_flags && non_zipf {
            anyhow::bail!("--zipf-s/--zipf-v require --distribution zipf");
        }

        if self.init && self.dry_run {
            anyhow::bail!("--init and --dry-run cannot be combined");
        }

        Ok(())
    }
}
