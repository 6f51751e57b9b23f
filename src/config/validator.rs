//! Configuration validation
//!
//! Everything here is a configuration error: it is detected before any
//! database work starts and fails the whole run.

use super::*;
use crate::distribution::zipf::ZipfDistribution;
use anyhow::{Context, Result};
use tracing::warn;

/// Validate complete configuration
pub fn validate_config(config: &BenchConfig) -> Result<()> {
    validate_database(&config.database)?;
    validate_workload(&config.workload)?;
    validate_distribution(&config.sampler.distribution)?;
    validate_target(config)?;

    if config.workload.session == SessionMode::Shared
        && config.workload.parallel > config.database.pool_size
    {
        warn!(
            parallel = config.workload.parallel,
            pool_size = config.database.pool_size,
            "more workers than pooled connections; workers will queue on the shared handle"
        );
    }

    Ok(())
}

/// Check that the benchmark will find a seeded table
///
/// An in-memory database starts empty and is gone once the process exits, so
/// a shared-session run against it has nothing to read, and bootstrapping it
/// seeds rows no later run can see.
pub fn validate_target(config: &BenchConfig) -> Result<()> {
    if config.database.dsn != MEMORY_DSN {
        return Ok(());
    }
    if config.runtime.initialize {
        warn!("initializing an in-memory database; the seeded rows are lost at exit");
        return Ok(());
    }
    if config.workload.session == SessionMode::Shared {
        anyhow::bail!(
            "shared-session lookups need a seeded table; \
             pass a database file DSN (seed it first with --init)"
        );
    }
    Ok(())
}

/// Validate database settings
pub fn validate_database(database: &DatabaseConfig) -> Result<()> {
    if database.dsn.trim().is_empty() {
        anyhow::bail!("dsn must not be empty");
    }
    if database.pool_size == 0 {
        anyhow::bail!("pool_size must be at least 1");
    }
    if database.rows == 0 {
        anyhow::bail!("rows must be at least 1");
    }
    if database.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }
    Ok(())
}

/// Validate workload settings
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    if workload.iterations == 0 {
        anyhow::bail!("iterations must be at least 1, got {}", workload.iterations);
    }
    if workload.parallel == 0 {
        anyhow::bail!("parallel must be at least 1, got {}", workload.parallel);
    }
    if workload.ops == 0 {
        anyhow::bail!("ops must be at least 1, got {}", workload.ops);
    }
    if workload.expect_name.is_some() && workload.session == SessionMode::Isolated {
        warn!("expect_name only applies to shared-session lookups and is ignored");
    }
    Ok(())
}

/// Validate distribution parameters
pub fn validate_distribution(dist: &KeyDistribution) -> Result<()> {
    match *dist {
        KeyDistribution::Fixed => Ok(()),
        KeyDistribution::Uniform { universe } => {
            if universe == 0 {
                anyhow::bail!("uniform universe must be at least 1");
            }
            Ok(())
        }
        KeyDistribution::Zipf { s, v, universe } => {
            ZipfDistribution::check(s, v, universe).context("Invalid zipf distribution")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> BenchConfig {
        let mut config = BenchConfig::default();
        config.database.dsn = "bench.db".to_string();
        config
    }

    #[test]
    fn test_validate_file_config() {
        assert!(validate_config(&file_config()).is_ok());
    }

    #[test]
    fn test_default_dsn_needs_seeded_table() {
        // Defaults are a shared lookup against an empty in-memory database
        let err = validate_config(&BenchConfig::default()).unwrap_err();
        assert!(err.to_string().contains("seeded table"), "{}", err);
    }

    #[test]
    fn test_memory_dsn_allowed_for_isolated_and_init() {
        let mut config = BenchConfig::default();
        config.workload.session = SessionMode::Isolated;
        assert!(validate_config(&config).is_ok());

        let mut config = BenchConfig::default();
        config.runtime.initialize = true;
        assert!(validate_config(&config).is_ok());

        let mut config = file_config();
        config.workload.session = SessionMode::Shared;
        assert!(validate_target(&config).is_ok());
    }

    #[test]
    fn test_validate_workload_counts() {
        let mut workload = WorkloadConfig::default();
        assert!(validate_workload(&workload).is_ok());

        workload.iterations = 0;
        assert!(validate_workload(&workload).is_err());

        workload.iterations = 10;
        workload.parallel = 0;
        assert!(validate_workload(&workload).is_err());

        workload.parallel = 4;
        workload.ops = 0;
        assert!(validate_workload(&workload).is_err());
    }

    #[test]
    fn test_validate_database() {
        let mut database = DatabaseConfig::default();
        assert!(validate_database(&database).is_ok());

        database.dsn = "  ".to_string();
        assert!(validate_database(&database).is_err());

        database.dsn = "bench.db".to_string();
        database.pool_size = 0;
        assert!(validate_database(&database).is_err());

        database.pool_size = 2;
        database.batch_size = 0;
        assert!(validate_database(&database).is_err());
    }

    #[test]
    fn test_validate_distribution_params() {
        let dist = KeyDistribution::Zipf { s: 1.5, v: 8.0, universe: 1000 };
        assert!(validate_distribution(&dist).is_ok());

        let dist = KeyDistribution::Zipf { s: 1.0, v: 8.0, universe: 1000 };
        assert!(validate_distribution(&dist).is_err());

        let dist = KeyDistribution::Zipf { s: 1.5, v: 0.0, universe: 1000 };
        assert!(validate_distribution(&dist).is_err());

        let dist = KeyDistribution::Zipf { s: 1.5, v: 8.0, universe: 0 };
        assert!(validate_distribution(&dist).is_err());

        let dist = KeyDistribution::Uniform { universe: 0 };
        assert!(validate_distribution(&dist).is_err());

        assert!(validate_distribution(&KeyDistribution::Fixed).is_ok());
    }
}
