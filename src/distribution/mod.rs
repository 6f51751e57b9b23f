//! Key distribution implementations
//!
//! This module provides the samplers that pick which row identifier each
//! benchmark iteration looks up. Different distributions model different key
//! popularity patterns.
//!
//! # Distributions
//!
//! - **Fixed**: no sampling, every iteration reads key 1 (no sampler is built)
//! - **Uniform**: equal probability for every key in `[1, M]`
//! - **Zipf**: power law over `[1, M]` (hot/cold keys)
//!
//! # Key-Based Design
//!
//! Samplers generate row identifiers in `[1, M]` directly, matching the
//! 1-based primary keys written by the schema bootstrap. All samplers are
//! seeded explicitly so a run can be reproduced draw for draw.
//!
//! # Example
//!
//! ```
//! use rowpulse::distribution::{Distribution, zipf::ZipfDistribution};
//!
//! let mut dist = ZipfDistribution::new(1.5, 8.0, 1_000, 0).unwrap();
//! let key = dist.next_key();
//! assert!((1..=1_000).contains(&key));
//! ```

pub mod uniform;
pub mod zipf;

use crate::config::{KeyDistribution, SamplerConfig};
use thiserror::Error;

/// Distribution trait for row key generation
///
/// # Thread Safety
///
/// Samplers must be `Send` so they can be built on one thread and moved to
/// another, but they are never shared. Keys are drawn by the single thread
/// that fills the work queue, before any worker starts.
pub trait Distribution: Send {
    /// Draw the next key in `[1, M]`
    fn next_key(&mut self) -> u64;
}

/// Invalid sampler parameters
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SamplerError {
    #[error("zipf exponent s must be greater than 1.0, got {0}")]
    InvalidExponent(f64),
    #[error("zipf taper v must be at least 1.0, got {0}")]
    InvalidTaper(f64),
    #[error("key universe must contain at least one key")]
    EmptyUniverse,
}

/// Build the sampler described by `config`
///
/// Returns `Ok(None)` for [`KeyDistribution::Fixed`]: tokens then carry no
/// key and iterations fall back to key 1.
pub fn create_distribution(
    config: &SamplerConfig,
) -> Result<Option<Box<dyn Distribution>>, SamplerError> {
    match config.distribution {
        KeyDistribution::Fixed => Ok(None),
        KeyDistribution::Uniform { universe } => Ok(Some(Box::new(
            uniform::UniformDistribution::new(universe, config.seed)?,
        ))),
        KeyDistribution::Zipf { s, v, universe } => Ok(Some(Box::new(
            zipf::ZipfDistribution::new(s, v, universe, config.seed)?,
        ))),
    }
}
