pub mod error;
pub mod ledger;
pub mod matching;
pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

pub use error::{DbError, Result};

const READER_POOL_SIZE: usize = 4;

/// Default time a statement waits on a held lock before failing as transient.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite store with a reader/writer split.
///
/// All mutations go through the single writer connection inside
/// `BEGIN IMMEDIATE` transactions, so read-then-decide sequences (capacity
/// checks, duplicate checks) are serialized. Read-only queries are spread
/// across a small pool of read-only connections and never wait on writers.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> anyhow::Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(busy_timeout)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(busy_timeout)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run a read-only closure on one of the reader connections.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self
            .readers
            .get(idx)
            .ok_or(DbError::Poisoned)?
            .lock()
            .map_err(|_| DbError::Poisoned)?;
        f(&conn)
    }

    /// Run a closure with exclusive access to the writer connection.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.writer.lock().map_err(|_| DbError::Poisoned)?;
        f(&mut conn)
    }

    /// Cheap liveness probe for the health endpoint.
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
