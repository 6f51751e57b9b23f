//! Mock backend for testing
//!
//! This module provides a mock implementation of the [`Backend`] trait that
//! keeps its rows in memory. It performs no real database work, which makes
//! engine tests fast and deterministic.
//!
//! # Features
//!
//! - Configurable failure of every lookup, or only of the k-th lookup
//! - Simulated per-lookup latency
//! - Counters for lookups and for every isolated-session statement
//! - Tracking of live sessions to prove sessions are released
//!
//! # Example
//!
//! ```
//! use rowpulse::backend::Backend;
//! use rowpulse::backend::mock::MockBackend;
//!
//! let backend = MockBackend::new().with_row(1, "jane");
//! assert_eq!(backend.point_lookup(1).unwrap(), "jane");
//! assert!(backend.point_lookup(2).is_err());
//! assert_eq!(backend.lookup_count(), 2);
//! ```

use super::{seed_name, Backend, Session, SCRATCH_NAME, TABLE};
use crate::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Mock backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Rows of table `t`
    rows: Arc<Mutex<HashMap<i64, String>>>,

    /// Whether every lookup should fail
    should_fail: Arc<Mutex<bool>>,

    /// 1-based lookup call that fails, if any
    fail_on_lookup: Arc<Mutex<Option<u64>>>,

    /// Sleep inside every lookup
    delay: Arc<Mutex<Duration>>,

    counters: Arc<MockCounters>,
}

/// Operation counters shared by the backend and its sessions
#[derive(Default)]
struct MockCounters {
    lookups: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_live: AtomicUsize,
    creates: AtomicU64,
    inserts: AtomicU64,
    session_reads: AtomicU64,
}

impl MockBackend {
    /// Create an empty mock backend whose lookups all succeed when rows exist
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to table `t`
    pub fn with_row(self, id: i64, name: &str) -> Self {
        lock(&self.rows).insert(id, name.to_string());
        self
    }

    /// Configure the backend to fail every lookup
    pub fn set_should_fail(&self, should_fail: bool) {
        *lock(&self.should_fail) = should_fail;
    }

    /// Fail only the `call`-th lookup (1-based); `None` disables
    pub fn set_fail_on_lookup(&self, call: Option<u64>) {
        *lock(&self.fail_on_lookup) = call;
    }

    /// Sleep for `delay` inside every lookup
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Lookups issued through the shared handle
    pub fn lookup_count(&self) -> u64 {
        self.counters.lookups.load(Ordering::SeqCst)
    }

    /// Sessions opened so far
    pub fn sessions_opened(&self) -> u64 {
        self.counters.sessions_opened.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet dropped
    pub fn sessions_live(&self) -> usize {
        self.counters.sessions_live.load(Ordering::SeqCst)
    }

    /// `CREATE TABLE` statements executed by sessions
    pub fn create_count(&self) -> u64 {
        self.counters.creates.load(Ordering::SeqCst)
    }

    /// `INSERT` statements executed by sessions
    pub fn insert_count(&self) -> u64 {
        self.counters.inserts.load(Ordering::SeqCst)
    }

    /// Reads issued by sessions
    pub fn session_read_count(&self) -> u64 {
        self.counters.session_reads.load(Ordering::SeqCst)
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn initialize(&self, rows: u64, _batch_size: u64) -> Result<()> {
        let mut table = lock(&self.rows);
        for id in 1..=rows {
            table.insert(id as i64, seed_name(id));
        }
        Ok(())
    }

    fn point_lookup(&self, id: i64) -> Result<String> {
        let call = self.counters.lookups.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if *lock(&self.should_fail) || *lock(&self.fail_on_lookup) == Some(call) {
            anyhow::bail!("mock lookup {} failed", call);
        }

        lock(&self.rows)
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no row with id {}", id))
    }

    fn open_session(&self) -> Result<Box<dyn Session>> {
        self.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.counters.sessions_live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            table: None,
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Session holding its own private table
pub struct MockSession {
    /// Rows of this session's table `t`, once created
    table: Option<Vec<String>>,
    counters: Arc<MockCounters>,
}

impl Session for MockSession {
    fn execute(&mut self, sql: &str) -> Result<()> {
        let statement = sql.trim_start().to_ascii_uppercase();

        if statement.starts_with("CREATE TABLE") {
            if self.table.is_some() {
                anyhow::bail!("table {} already exists", TABLE);
            }
            self.counters.creates.fetch_add(1, Ordering::SeqCst);
            self.table = Some(Vec::new());
            Ok(())
        } else if statement.starts_with("INSERT") {
            let table = self.table.as_mut()
                .ok_or_else(|| anyhow::anyhow!("no such table: {}", TABLE))?;
            self.counters.inserts.fetch_add(1, Ordering::SeqCst);
            table.push(SCRATCH_NAME.to_string());
            Ok(())
        } else {
            anyhow::bail!("mock session cannot execute: {}", sql)
        }
    }

    fn query_name(&mut self, id: i64) -> Result<String> {
        self.counters.session_reads.fetch_add(1, Ordering::SeqCst);
        let table = self.table.as_ref()
            .ok_or_else(|| anyhow::anyhow!("no such table: {}", TABLE))?;
        usize::try_from(id - 1)
            .ok()
            .and_then(|index| table.get(index))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no row with id {}", id))
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.counters.sessions_live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
