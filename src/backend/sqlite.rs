//! SQLite backend
//!
//! The shared handle is a fixed pool of connections, each behind its own
//! mutex, handed out round-robin. One `SqliteBackend` therefore presents as a
//! single handle while letting up to `pool_size` lookups run at once, which is
//! the internal concurrency the shared-session benchmark exercises.
//!
//! `:memory:` is mapped to a uniquely named shared-cache in-memory database so
//! every pooled connection sees the same tables. The database lives as long
//! as the backend does.
//!
//! Isolated sessions never touch the pool: each one is a private `:memory:`
//! connection that disappears, tables and all, when the session is dropped.

use super::{seed_name, Backend, Session, LOOKUP_SQL};
use crate::config::{DatabaseConfig, MEMORY_DSN};
use crate::Result;
use anyhow::Context;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Distinguishes in-memory databases opened by different backends in one process
static MEMORY_DB_ID: AtomicU64 = AtomicU64::new(0);

/// Pooled SQLite connection handle
pub struct SqliteBackend {
    /// Path or URI every pooled connection was opened with
    target: String,

    /// Pooled connections, one mutex each
    connections: Vec<Mutex<Connection>>,

    /// Round-robin cursor into `connections`
    cursor: AtomicUsize,

    busy_timeout: Duration,
}

impl SqliteBackend {
    /// Open `config.pool_size` connections to `config.dsn`
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if config.pool_size == 0 {
            anyhow::bail!("pool_size must be at least 1");
        }

        let target = resolve_target(&config.dsn);
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let mut connections = Vec::with_capacity(config.pool_size);
        for _ in 0..config.pool_size {
            let conn = open_connection(&target, busy_timeout)
                .with_context(|| format!("Failed to open SQLite database: {}", config.dsn))?;
            connections.push(Mutex::new(conn));
        }

        debug!(db = %target, pool_size = config.pool_size, "opened sqlite pool");

        Ok(Self {
            target,
            connections,
            cursor: AtomicUsize::new(0),
            busy_timeout,
        })
    }

    /// Number of pooled connections
    pub fn pool_size(&self) -> usize {
        self.connections.len()
    }

    /// Path or URI the pool is connected to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Next pooled connection, round-robin
    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index]
            .lock()
            .map_err(|_| {
                anyhow::anyhow!("SQLite connection {} poisoned by a panicked worker", index)
            })
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn initialize(&self, rows: u64, batch_size: u64) -> Result<()> {
        if batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }

        let mut conn = self.connection()?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("Failed to enable WAL")?;
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
            .context("Failed to create table t")?;

        let mut index = 0u64;
        while index < rows {
            let end = (index + batch_size).min(rows);
            info!(index, "inserting");

            let tx = conn.transaction().context("Failed to begin transaction")?;
            {
                let mut stmt = tx.prepare_cached("INSERT INTO t (id, name) VALUES (?1, ?2)")?;
                for id in (index + 1)..=end {
                    stmt.execute(params![id as i64, seed_name(id)])
                        .with_context(|| format!("Failed to insert row {}", id))?;
                }
            }
            tx.commit().context("Failed to commit seed batch")?;

            index = end;
        }

        info!(rows, "schema initialized");
        Ok(())
    }

    fn point_lookup(&self, id: i64) -> Result<String> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(LOOKUP_SQL)?;
        let name = stmt
            .query_row(params![id], |row| row.get::<_, String>(0))
            .with_context(|| format!("Point lookup of id {} failed", id))?;
        Ok(name)
    }

    fn open_session(&self) -> Result<Box<dyn Session>> {
        let conn = Connection::open_in_memory().context("Failed to open isolated session")?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

/// Private in-memory connection owned by one iteration
pub struct SqliteSession {
    conn: Connection,
}

impl Session for SqliteSession {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Failed to execute: {}", sql))
    }

    fn query_name(&mut self, id: i64) -> Result<String> {
        let mut stmt = self.conn.prepare_cached(LOOKUP_SQL)?;
        let name = stmt
            .query_row(params![id], |row| row.get::<_, String>(0))
            .with_context(|| format!("Point lookup of id {} failed", id))?;
        Ok(name)
    }
}

/// Map a DSN to what every pooled connection should open
fn resolve_target(dsn: &str) -> String {
    if dsn == MEMORY_DSN {
        let id = MEMORY_DB_ID.fetch_add(1, Ordering::Relaxed);
        format!("file:rowpulse-{}-{}?mode=memory&cache=shared", std::process::id(), id)
    } else {
        dsn.to_string()
    }
}

fn open_connection(target: &str, busy_timeout: Duration) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(target, flags)?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}
