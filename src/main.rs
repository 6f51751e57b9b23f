//! rowpulse CLI entry point

use anyhow::{Context, Result};
use rowpulse::backend::sqlite::SqliteBackend;
use rowpulse::backend::Backend;
use rowpulse::config::{cli::Cli, toml::load_config, validator::validate_config, BenchConfig};
use rowpulse::coordinator::run_benchmark;
use rowpulse::output::{json::write_json_output, text};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = load_config(&cli)?;
    init_logging(config.runtime.debug);
    validate_config(&config).context("Configuration validation failed")?;
    debug!(?config, "resolved configuration");

    if config.runtime.dry_run {
        text::print_configuration(&config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let backend = SqliteBackend::open(&config.database)?;
    debug!(db = backend.target(), pool_size = backend.pool_size(), "backend ready");

    if config.runtime.initialize {
        return initialize(&config, &backend);
    }

    run(&config, &backend)
}

/// Schema bootstrap mode: create and seed the table, then exit
fn initialize(config: &BenchConfig, backend: &dyn Backend) -> Result<()> {
    info!(rows = config.database.rows, dsn = %config.database.dsn, "initializing schema");
    backend
        .initialize(config.database.rows, config.database.batch_size)
        .context("Schema initialization failed")
}

/// Benchmark mode: time the run and report it
fn run(config: &BenchConfig, backend: &dyn Backend) -> Result<()> {
    let result = run_benchmark(config, backend)?;

    text::print_summary(&result);

    if let Some(ref path) = config.output.json_output {
        write_json_output(path, &result, config, backend.name())?;
        info!(path = %path.display(), "wrote JSON results");
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout carries only results
fn init_logging(debug: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into()),
        )
        .init();
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rowpulse::config::toml::{merge_cli_with_config, parse_toml_string};

    #[test]
    fn test_debug_from_toml_enables_debug_filter() {
        let base = parse_toml_string("[runtime]\ndebug = true").unwrap();
        let cli = Cli::try_parse_from(["rowpulse", "bench.db"]).unwrap();
        let config = merge_cli_with_config(&cli, base).unwrap();

        assert!(config.runtime.debug);
        assert_eq!(default_filter(config.runtime.debug), "debug");
    }

    #[test]
    fn test_default_filter_is_warn() {
        let cli = Cli::try_parse_from(["rowpulse", "bench.db"]).unwrap();
        let config = merge_cli_with_config(&cli, BenchConfig::default()).unwrap();

        assert_eq!(default_filter(config.runtime.debug), "warn");
    }
}
