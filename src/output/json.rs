//! JSON output formatting
//!
//! Writes one result document per successful run. Failed runs write nothing.

use crate::config::BenchConfig;
use crate::stats::RunResult;
use crate::util::time::format_duration;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

/// Duration with both nanoseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub nanos: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            nanos: u64::try_from(d.as_nanos()).unwrap_or(u64::MAX),
            human: format_duration(d),
        }
    }
}

/// Result document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRunOutput {
    /// RFC 3339 time the document was written
    pub timestamp: String,
    pub backend: String,
    pub iterations: u64,
    pub parallel: usize,
    pub session: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<usize>,
    pub distribution: String,
    pub seed: u64,
    pub elapsed_secs: f64,
    pub elapsed: JsonDuration,
    pub mean_per_iteration: JsonDuration,
    pub iterations_per_sec: f64,
    pub per_worker: Vec<u64>,
}

impl JsonRunOutput {
    pub fn new(result: &RunResult, config: &BenchConfig, backend: &str) -> Self {
        let ops = match config.workload.session {
            crate::config::SessionMode::Isolated => Some(config.workload.ops),
            crate::config::SessionMode::Shared => None,
        };

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            backend: backend.to_string(),
            iterations: result.iterations,
            parallel: result.parallel,
            session: config.workload.session.to_string(),
            ops,
            distribution: config.sampler.distribution.to_string(),
            seed: config.sampler.seed,
            elapsed_secs: result.elapsed.as_secs_f64(),
            elapsed: JsonDuration::from_duration(result.elapsed),
            mean_per_iteration: JsonDuration::from_duration(result.mean_per_iteration),
            iterations_per_sec: result.iterations_per_sec(),
            per_worker: result.per_worker.clone(),
        }
    }
}

/// Write the result document for `result` to `output_path`
pub fn write_json_output(
    output_path: &Path,
    result: &RunResult,
    config: &BenchConfig,
    backend: &str,
) -> Result<()> {
    let document = JsonRunOutput::new(result, config, backend);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output file: {}", output_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &document)
        .with_context(|| format!("Failed to write JSON output file: {}", output_path.display()))?;

    Ok(())
}
