//! First-failure-wins error cell
//!
//! Workers record into the cell from any thread. Only the first error is
//! kept; the flag lets every worker notice the failure on its next pull and
//! stop taking tokens. In-flight iterations are never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Single-assignment error slot shared by all workers of one run
#[derive(Default)]
pub struct FailureCell {
    failed: AtomicBool,
    error: Mutex<Option<anyhow::Error>>,
}

impl FailureCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` if no error has been recorded yet
    ///
    /// Returns `true` when this call's error is the one kept.
    pub fn record(&self, err: anyhow::Error) -> bool {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        self.failed.store(true, Ordering::Release);
        true
    }

    /// Whether any worker has recorded an error
    #[inline]
    pub fn is_set(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// The kept error, if any; call after all workers have joined
    pub fn into_result(self) -> crate::Result<()> {
        match self.error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
