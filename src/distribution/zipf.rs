//! Zipf distribution implementation
//!
//! This module provides a Zipf distribution (also known as Zipfian or power law
//! distribution) where a small number of keys receive the majority of lookups.
//!
//! # Characteristics
//!
//! - Power law: P(k) ∝ (v + k)^(-s) for k in [0, M)
//! - `s` close to 1.0: long tail, mild skew
//! - Large `s` (2.0+): almost every draw hits the first few keys
//! - `v` tapers the head: larger `v` flattens the hottest keys
//!
//! # Performance
//!
//! Uses rejection-inversion sampling (Hörmann & Derflinger), so a draw costs
//! O(1) expected time and nothing is precomputed per key. Universes of 10^8
//! keys and beyond cost the same as small ones.
//!
//! # Example
//!
//! ```
//! use rowpulse::distribution::{Distribution, zipf::ZipfDistribution};
//!
//! let mut dist = ZipfDistribution::new(1.5, 8.0, 100_000_000, 0).unwrap();
//! let key = dist.next_key();
//! assert!(key >= 1 && key <= 100_000_000);
//! ```

use super::{Distribution, SamplerError};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Zipf distribution for skewed key popularity
///
/// Draws rank `k` in `[0, M - 1]` with probability proportional to
/// `(v + k)^(-s)` and returns `k + 1`, so key 1 is always the hottest.
pub struct ZipfDistribution {
    /// Exponent s (> 1)
    q: f64,

    /// Taper v (>= 1)
    v: f64,

    /// Largest rank that can be drawn (M - 1)
    imax: f64,

    /// Number of keys (M)
    universe: u64,

    one_minus_q: f64,
    one_minus_q_inv: f64,
    hxm: f64,
    hx0_minus_hxm: f64,

    /// Acceptance shortcut: ranks within `s` of the inverted value are accepted
    /// without evaluating `h` again
    s: f64,

    rng: Xoshiro256PlusPlus,
}

impl ZipfDistribution {
    /// Create a new Zipf distribution
    ///
    /// # Arguments
    ///
    /// * `s` - Skew exponent, must be greater than 1.0
    /// * `v` - Taper, must be at least 1.0
    /// * `universe` - Number of keys M; draws fall in `[1, M]`
    /// * `seed` - RNG seed; equal parameters and seed give equal sequences
    pub fn new(s: f64, v: f64, universe: u64, seed: u64) -> Result<Self, SamplerError> {
        Self::check(s, v, universe)?;

        let mut dist = Self {
            q: s,
            v,
            imax: (universe - 1) as f64,
            universe,
            one_minus_q: 1.0 - s,
            one_minus_q_inv: 1.0 / (1.0 - s),
            hxm: 0.0,
            hx0_minus_hxm: 0.0,
            s: 0.0,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        };

        dist.hxm = dist.h(dist.imax + 0.5);
        dist.hx0_minus_hxm = dist.h(0.5) - (dist.v.ln() * -dist.q).exp() - dist.hxm;
        dist.s = 1.0 - dist.h_inv(dist.h(1.5) - (-dist.q * (dist.v + 1.0).ln()).exp());

        Ok(dist)
    }

    /// Validate parameters without building a sampler
    pub fn check(s: f64, v: f64, universe: u64) -> Result<(), SamplerError> {
        // Negated comparisons so NaN is rejected too
        if !(s > 1.0) {
            return Err(SamplerError::InvalidExponent(s));
        }
        if !(v >= 1.0) {
            return Err(SamplerError::InvalidTaper(v));
        }
        if universe == 0 {
            return Err(SamplerError::EmptyUniverse);
        }
        Ok(())
    }

    #[inline]
    fn h(&self, x: f64) -> f64 {
        (self.one_minus_q * (self.v + x).ln()).exp() * self.one_minus_q_inv
    }

    #[inline]
    fn h_inv(&self, x: f64) -> f64 {
        (self.one_minus_q_inv * (self.one_minus_q * x).ln()).exp() - self.v
    }

    fn next_rank(&mut self) -> f64 {
        loop {
            let r: f64 = self.rng.gen();
            let ur = self.hxm + r * self.hx0_minus_hxm;
            let x = self.h_inv(ur);
            let k = (x + 0.5).floor();

            if k - x <= self.s {
                return k;
            }
            if ur >= self.h(k + 0.5) - (-(k + self.v).ln() * self.q).exp() {
                return k;
            }
        }
    }
}

impl Distribution for ZipfDistribution {
    fn next_key(&mut self) -> u64 {
        let rank = self.next_rank() as u64;
        (rank + 1).min(self.universe)
    }
}
