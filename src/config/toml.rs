//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, DistributionKind, SessionKind};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<BenchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<BenchConfig> {
    let config: BenchConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration: TOML file (if any), then CLI flags on top
pub fn load_config(cli: &Cli) -> Result<BenchConfig> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => BenchConfig::default(),
    };
    merge_cli_with_config(cli, base)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: BenchConfig) -> Result<BenchConfig> {
    // Override database settings
    if let Some(ref dsn) = cli.dsn {
        config.database.dsn = dsn.clone();
    }
    if let Some(rows) = cli.rows {
        config.database.rows = rows;
    }
    if let Some(batch_size) = cli.batch_size {
        config.database.batch_size = batch_size;
    }
    if let Some(pool_size) = cli.pool_size {
        config.database.pool_size = pool_size;
    }
    if let Some(timeout) = cli.busy_timeout_ms {
        config.database.busy_timeout_ms = timeout;
    }

    // Override workload settings
    if let Some(n) = cli.iterations {
        config.workload.iterations = n;
    }
    if let Some(p) = cli.parallel {
        config.workload.parallel = p;
    }
    if let Some(ops) = cli.ops {
        config.workload.ops = ops;
    }
    if let Some(session) = cli.session {
        config.workload.session = match session {
            SessionKind::Shared => SessionMode::Shared,
            SessionKind::Isolated => SessionMode::Isolated,
        };
    }
    if let Some(ref name) = cli.expect_name {
        config.workload.expect_name = Some(name.clone());
    }

    // Override sampler settings
    if let Some(seed) = cli.seed {
        config.sampler.seed = seed;
    }
    config.sampler.distribution =
        merge_distribution(cli, &config.sampler.distribution, config.database.rows);

    // Override output settings
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    // Override runtime settings
    if cli.init {
        config.runtime.initialize = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

/// Resolve the key distribution from CLI flags and the configured one
///
/// The distribution kind comes from `--distribution` when given, else from the
/// configuration. Parameters not given on the command line keep their
/// configured values, falling back to defaults; the universe falls back to
/// the seeded row count.
fn merge_distribution(cli: &Cli, current: &KeyDistribution, rows: u64) -> KeyDistribution {
    let kind = cli.distribution.unwrap_or(match current {
        KeyDistribution::Fixed => DistributionKind::Fixed,
        KeyDistribution::Uniform { .. } => DistributionKind::Uniform,
        KeyDistribution::Zipf { .. } => DistributionKind::Zipf,
    });
    let universe = cli.universe.or(current.universe()).unwrap_or(rows);

    match kind {
        DistributionKind::Fixed => KeyDistribution::Fixed,
        DistributionKind::Uniform => KeyDistribution::Uniform { universe },
        DistributionKind::Zipf => {
            let (s, v) = match current {
                KeyDistribution::Zipf { s, v, .. } => (*s, *v),
                _ => (DEFAULT_ZIPF_S, DEFAULT_ZIPF_V),
            };
            KeyDistribution::Zipf {
                s: cli.zipf_s.unwrap_or(s),
                v: cli.zipf_v.unwrap_or(v),
                universe,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const SAMPLE: &str = r#"
        [database]
        dsn = "bench.db"
        pool_size = 4
        rows = 100000000

        [workload]
        iterations = 5000
        parallel = 8
        session = "Shared"

        [sampler]
        seed = 42
        distribution = { Zipf = { s = 1.5, v = 8.0, universe = 100000000 } }
    "#;

    #[test]
    fn test_parse_toml_string() {
        let config = parse_toml_string(SAMPLE).unwrap();
        assert_eq!(config.database.dsn, "bench.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.workload.iterations, 5000);
        assert_eq!(config.workload.parallel, 8);
        assert_eq!(config.workload.ops, 1);
        assert_eq!(config.sampler.seed, 42);
        assert_eq!(
            config.sampler.distribution,
            KeyDistribution::Zipf { s: 1.5, v: 8.0, universe: 100_000_000 }
        );
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config.database.dsn, ":memory:");
        assert_eq!(config.workload.iterations, 1000);
        assert_eq!(config.sampler.distribution, KeyDistribution::Fixed);
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(parse_toml_string("[workload]\niterations = \"many\"").is_err());
    }

    #[test]
    fn test_parse_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = parse_toml_file(&path).unwrap();
        assert_eq!(config.workload.parallel, 8);

        assert!(parse_toml_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let base = parse_toml_string(SAMPLE).unwrap();
        let cli = Cli::try_parse_from(["rowpulse", "other.db", "-n", "10", "--zipf-s", "2.0"])
            .unwrap();

        let config = merge_cli_with_config(&cli, base).unwrap();
        assert_eq!(config.database.dsn, "other.db");
        assert_eq!(config.workload.iterations, 10);
        assert_eq!(config.workload.parallel, 8);
        assert_eq!(
            config.sampler.distribution,
            KeyDistribution::Zipf { s: 2.0, v: 8.0, universe: 100_000_000 }
        );
    }

    #[test]
    fn test_cli_distribution_defaults_to_rows() {
        let cli = Cli::try_parse_from(["rowpulse", "--distribution", "zipf", "--rows", "5000"])
            .unwrap();
        let config = merge_cli_with_config(&cli, BenchConfig::default()).unwrap();
        assert_eq!(
            config.sampler.distribution,
            KeyDistribution::Zipf { s: DEFAULT_ZIPF_S, v: DEFAULT_ZIPF_V, universe: 5000 }
        );

        let cli = Cli::try_parse_from(["rowpulse", "--distribution", "uniform", "--universe", "7"])
            .unwrap();
        let config = merge_cli_with_config(&cli, BenchConfig::default()).unwrap();
        assert_eq!(config.sampler.distribution, KeyDistribution::Uniform { universe: 7 });
    }

    #[test]
    fn test_cli_session_and_flags() {
        let cli = Cli::try_parse_from(["rowpulse", "--session", "isolated", "--ops", "5", "--init"])
            .unwrap();
        let config = merge_cli_with_config(&cli, BenchConfig::default()).unwrap();
        assert_eq!(config.workload.session, SessionMode::Isolated);
        assert_eq!(config.workload.ops, 5);
        assert!(config.runtime.initialize);
    }
}
