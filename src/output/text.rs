//! Human-readable text output
//!
//! The run summary is the only thing written to stdout, so it can be piped
//! or grepped. Diagnostics go through `tracing` to stderr.

use crate::config::BenchConfig;
use crate::stats::RunResult;
use crate::util::time::format_duration;
use std::fmt::Write;

/// The one-line run summary
///
/// ```
/// use rowpulse::output::text::summary_line;
/// use rowpulse::stats::RunResult;
/// use std::time::Duration;
///
/// let result = RunResult::new(1000, 4, Duration::from_millis(1500), vec![250; 4]);
/// assert_eq!(summary_line(&result), "1000 iterations completed in 1.500000s (1.5ms/iter)");
/// ```
pub fn summary_line(result: &RunResult) -> String {
    format!(
        "{} iterations completed in {:.6}s ({}/iter)",
        result.iterations,
        result.elapsed.as_secs_f64(),
        format_duration(result.mean_per_iteration)
    )
}

/// Print the run summary to stdout
pub fn print_summary(result: &RunResult) {
    println!("{}", summary_line(result));
}

/// Resolved configuration, as shown by `--dry-run`
pub fn format_configuration(config: &BenchConfig) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Configuration:");
    let _ = writeln!(out, "  Database:");
    let _ = writeln!(out, "    DSN: {}", config.database.dsn);
    let _ = writeln!(out, "    Pool size: {}", config.database.pool_size);
    let _ = writeln!(out, "    Busy timeout: {}ms", config.database.busy_timeout_ms);
    let _ = writeln!(out, "    Rows: {}", config.database.rows);
    let _ = writeln!(out, "  Workload:");
    let _ = writeln!(out, "    Iterations: {}", config.workload.iterations);
    let _ = writeln!(out, "    Parallel: {}", config.workload.parallel);
    let _ = writeln!(out, "    Session: {}", config.workload.session);
    if config.workload.session == crate::config::SessionMode::Isolated {
        let _ = writeln!(out, "    Ops per session: {}", config.workload.ops);
    }
    if let Some(ref name) = config.workload.expect_name {
        let _ = writeln!(out, "    Expect name: {:?}", name);
    }
    let _ = writeln!(out, "  Sampler:");
    let _ = writeln!(out, "    Distribution: {}", config.sampler.distribution);
    let _ = writeln!(out, "    Seed: {}", config.sampler.seed);
    if let Some(ref path) = config.output.json_output {
        let _ = writeln!(out, "  Output:");
        let _ = writeln!(out, "    JSON: {}", path.display());
    }

    out
}

/// Print the resolved configuration to stdout
pub fn print_configuration(config: &BenchConfig) {
    print!("{}", format_configuration(config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyDistribution, SessionMode};
    use std::time::Duration;

    #[test]
    fn test_summary_line_format() {
        let result = RunResult::new(100, 4, Duration::from_nanos(35_000), vec![25; 4]);
        assert_eq!(
            summary_line(&result),
            "100 iterations completed in 0.000035s (350ns/iter)"
        );
    }

    #[test]
    fn test_summary_line_whole_seconds() {
        let result = RunResult::new(2, 1, Duration::from_secs(3), vec![2]);
        assert_eq!(summary_line(&result), "2 iterations completed in 3.000000s (1.5s/iter)");
    }

    #[test]
    fn test_format_configuration() {
        let mut config = BenchConfig::default();
        config.workload.session = SessionMode::Isolated;
        config.workload.ops = 5;
        config.sampler.distribution = KeyDistribution::Zipf { s: 1.5, v: 8.0, universe: 100 };

        let text = format_configuration(&config);
        assert!(text.starts_with("Configuration:\n"));
        assert!(text.contains("    Session: isolated\n"));
        assert!(text.contains("    Ops per session: 5\n"));
        assert!(text.contains("    Distribution: zipf (s=1.5, v=8, M=100)\n"));
        assert!(!text.contains("JSON"));
    }
}
