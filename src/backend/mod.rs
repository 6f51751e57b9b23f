//! Database backend abstraction
//!
//! A backend is the connection handle the benchmark drives. It is opened once
//! by the caller, primed by one untimed iteration, shared by every worker, and
//! dropped after results are reported.
//!
//! # Architecture
//!
//! The [`Backend`] trait gives the worker pool a uniform interface whatever
//! the storage engine is:
//!
//! - **Shared handle**: [`Backend::point_lookup`] is called concurrently from
//!   all workers. The backend brings its own internal concurrency control
//!   (a connection pool, a single-writer queue, ...); the engine adds none.
//! - **Isolated sessions**: [`Backend::open_session`] returns a brand-new
//!   [`Session`] owned by exactly one iteration. Dropping it releases the
//!   session on every exit path.
//! - **Schema bootstrap**: [`Backend::initialize`] creates and seeds the lookup
//!   table. It is only called in initialize mode, never during a timed run.
//!
//! # Backends
//!
//! - **SQLite** ([`sqlite::SqliteBackend`]): pooled `rusqlite` connections
//! - **Mock** ([`mock::MockBackend`]): in-process rows with failure injection,
//!   used by tests

pub mod mock;
pub mod sqlite;

use crate::Result;

/// Name of the lookup table
pub const TABLE: &str = "t";

/// Point lookup issued by every read
pub const LOOKUP_SQL: &str = "SELECT name FROM t WHERE id = ?1";

/// Throwaway table created by each isolated session
pub const SCRATCH_CREATE_SQL: &str =
    "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)";

/// Single row seeded into the throwaway table (gets id 1)
pub const SCRATCH_INSERT_SQL: &str = "INSERT INTO t (name) VALUES ('jane')";

/// Name stored in the throwaway row
pub const SCRATCH_NAME: &str = "jane";

/// Name written for row `id` by schema bootstrap
pub fn seed_name(id: u64) -> String {
    format!("{:8x}", id)
}

/// A single exclusively-owned database session
///
/// Sessions are created per iteration and never shared between workers.
pub trait Session {
    /// Execute a statement that returns no rows
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Read the `name` column of row `id` in table `t`
    fn query_name(&mut self, id: i64) -> Result<String>;
}

/// Connection handle trait for all backends
///
/// # Thread Safety
///
/// Backends must be `Send + Sync`: a single instance is borrowed by every
/// worker thread at once in the shared-session variant.
///
/// # Error Handling
///
/// All methods return `Result<T>`. Errors are surfaced verbatim to the
/// caller; no method retries.
pub trait Backend: Send + Sync {
    /// Backend name for logs and reports
    fn name(&self) -> &'static str;

    /// Create table `t` and seed rows `1..=rows`, `batch_size` rows per transaction
    fn initialize(&self, rows: u64, batch_size: u64) -> Result<()>;

    /// Read the `name` of row `id` through the shared handle
    ///
    /// A missing row is an error.
    fn point_lookup(&self, id: i64) -> Result<String>;

    /// Open a brand-new session isolated from the shared handle
    fn open_session(&self) -> Result<Box<dyn Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_name_is_padded_hex() {
        assert_eq!(seed_name(1), "       1");
        assert_eq!(seed_name(255), "      ff");
        assert_eq!(seed_name(0xdead_beef), "deadbeef");
    }
}
