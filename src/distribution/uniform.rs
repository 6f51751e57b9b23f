//! Uniform key distribution
//!
//! Every key in `[1, M]` is equally likely. Useful as a no-skew baseline to
//! compare against Zipf runs over the same table.
//!
//! # Performance
//!
//! Uses the xoshiro256++ PRNG which is fast and has good statistical
//! properties.

use super::{Distribution, SamplerError};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform key distribution over `[1, universe]`
pub struct UniformDistribution {
    universe: u64,
    rng: Xoshiro256PlusPlus,
}

impl UniformDistribution {
    /// Create a new uniform distribution with a fixed seed
    pub fn new(universe: u64, seed: u64) -> Result<Self, SamplerError> {
        if universe == 0 {
            return Err(SamplerError::EmptyUniverse);
        }
        Ok(Self {
            universe,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        })
    }
}

impl Distribution for UniformDistribution {
    #[inline(always)]
    fn next_key(&mut self) -> u64 {
        self.rng.gen_range(1..=self.universe)
    }
}
