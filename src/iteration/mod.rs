//! Iteration operations
//!
//! An iteration is the unit of work being measured. The worker pool calls
//! [`Iteration::run`] once per token and knows nothing else about it.
//!
//! # Variants
//!
//! - [`SharedLookup`]: one point lookup through the already-open shared
//!   handle. Exercises the handle's internal concurrency.
//! - [`IsolatedSession`]: open a fresh session, create a throwaway table,
//!   insert one row, read it `ops` times, drop the session. Exercises session
//!   startup cost rather than query cost.
//!
//! Any `Fn(Option<u64>) -> Result<()> + Sync` closure is also an iteration,
//! which is how tests inject counting or failing operations.

use crate::backend::{Backend, SCRATCH_CREATE_SQL, SCRATCH_INSERT_SQL, SCRATCH_NAME};
use crate::config::{SessionMode, WorkloadConfig};
use crate::Result;

/// Key used when a token carries none
pub const DEFAULT_KEY: u64 = 1;

/// Operation repeated once per token
///
/// Must be `Sync`: one instance is borrowed by every worker at once.
pub trait Iteration: Sync {
    /// Perform one iteration for a token with the given key
    fn run(&self, key: Option<u64>) -> Result<()>;
}

impl<F> Iteration for F
where
    F: Fn(Option<u64>) -> Result<()> + Sync,
{
    fn run(&self, key: Option<u64>) -> Result<()> {
        self(key)
    }
}

/// Point lookup through the shared handle
pub struct SharedLookup<'a> {
    backend: &'a dyn Backend,
    expect_name: Option<&'a str>,
}

impl<'a> SharedLookup<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend, expect_name: None }
    }

    /// Fail any lookup whose name differs from `name`
    pub fn expecting(mut self, name: &'a str) -> Self {
        self.expect_name = Some(name);
        self
    }
}

impl Iteration for SharedLookup<'_> {
    fn run(&self, key: Option<u64>) -> Result<()> {
        let id = key_to_id(key.unwrap_or(DEFAULT_KEY))?;
        let name = self.backend.point_lookup(id)?;

        if let Some(expected) = self.expect_name {
            if name != expected {
                anyhow::bail!("id {}: name={:?}, want {:?}", id, name, expected);
            }
        }
        Ok(())
    }
}

/// Fresh session per iteration: create, seed, read `ops` times, release
pub struct IsolatedSession<'a> {
    backend: &'a dyn Backend,
    ops: usize,
}

impl<'a> IsolatedSession<'a> {
    pub fn new(backend: &'a dyn Backend, ops: usize) -> Self {
        Self { backend, ops }
    }
}

impl Iteration for IsolatedSession<'_> {
    fn run(&self, _key: Option<u64>) -> Result<()> {
        // Dropped on every return path, releasing the session
        let mut session = self.backend.open_session()?;

        session.execute(SCRATCH_CREATE_SQL)?;
        session.execute(SCRATCH_INSERT_SQL)?;

        for _ in 0..self.ops {
            let name = session.query_name(1)?;
            if name != SCRATCH_NAME {
                anyhow::bail!("name={:?}, want {:?}", name, SCRATCH_NAME);
            }
        }
        Ok(())
    }
}

/// Build the iteration selected by the workload configuration
pub fn build_iteration<'a>(
    backend: &'a dyn Backend,
    workload: &'a WorkloadConfig,
) -> Box<dyn Iteration + 'a> {
    match workload.session {
        SessionMode::Shared => {
            let lookup = SharedLookup::new(backend);
            match workload.expect_name.as_deref() {
                Some(name) => Box::new(lookup.expecting(name)),
                None => Box::new(lookup),
            }
        }
        SessionMode::Isolated => Box::new(IsolatedSession::new(backend, workload.ops)),
    }
}

fn key_to_id(key: u64) -> Result<i64> {
    i64::try_from(key).map_err(|_| anyhow::anyhow!("key {} does not fit a row id", key))
}
