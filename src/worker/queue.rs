//! Fixed-capacity work queue
//!
//! All `N` tokens are created up front by a single thread, drawing their keys
//! from the sampler as they go, and the queue is never written again. Workers
//! only pop, so there is no producer/consumer backpressure: a pull never
//! waits, and `None` means the run has no iterations left.

use crate::distribution::Distribution;
use crate::Result;
use crossbeam::queue::ArrayQueue;

/// One iteration owed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Position in creation order (0-based)
    pub seq: u64,

    /// Sampled row key, `None` when sampling is disabled
    pub key: Option<u64>,
}

/// Write-once queue holding exactly `N` tokens
pub struct WorkQueue {
    tokens: ArrayQueue<Token>,
    capacity: usize,
}

impl WorkQueue {
    /// Create and close a queue of `n` tokens
    ///
    /// With a sampler, every token carries one draw, taken in token order on
    /// the calling thread. Without one, tokens carry no key.
    pub fn fill(n: usize, mut sampler: Option<&mut (dyn Distribution + '_)>) -> Result<Self> {
        if n == 0 {
            anyhow::bail!("work queue needs at least one token");
        }

        let tokens = ArrayQueue::new(n);
        for seq in 0..n {
            let token = Token {
                seq: seq as u64,
                key: sampler.as_mut().map(|dist| dist.next_key()),
            };
            tokens
                .push(token)
                .map_err(|_| anyhow::anyhow!("work queue overflow at token {}", seq))?;
        }

        Ok(Self { tokens, capacity: n })
    }

    /// Take the next token, or `None` once every token has been handed out
    ///
    /// Safe to call from any number of threads; each token is returned once.
    #[inline]
    pub fn next(&self) -> Option<Token> {
        self.tokens.pop()
    }

    /// Tokens not yet handed out
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens the queue was filled with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether every token has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.tokens.is_empty()
    }
}
