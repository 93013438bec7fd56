//! SQLite storage implementation.
//!
//! `TodoStore` owns the one connection to the database file. Every call is a
//! blocking, single-statement operation; callers serialize access.
//!
//! The connection moves through a small state machine:
//!
//! ```text
//! Uninitialized ──initialize──▶ Open ──detach──▶ Closing ──▶ Closed
//!                                 ▲                             │
//!                                 └──── Open ◀── Reopening ◀────┘
//! ```
//!
//! Only the snapshot exporter leaves `Open`, and only through
//! [`DetachedStore`], whose drop path always attempts to come back.

use crate::error::{Error, Result};
use crate::model::Task;
use crate::storage::detach::DetachedStore;
use crate::storage::ids::{ClockIds, IdGenerator};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default SQLite busy timeout.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of the store's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Created but never opened; the first operation opens it.
    Uninitialized,
    Open,
    Closing,
    Closed,
    Reopening,
}

impl ConnectionState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Reopening => "reopening",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame counts reported by `PRAGMA wal_checkpoint`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckpointStats {
    /// The checkpoint could not run to completion (a reader or writer held a lock).
    pub busy: bool,
    /// Frames in the write-ahead log, or -1 when the database is not in WAL mode.
    pub wal_frames: i64,
    /// Frames copied back into the main database file.
    pub checkpointed_frames: i64,
}

impl CheckpointStats {
    /// Every logged frame reached the main database file.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.busy && self.checkpointed_frames == self.wal_frames
    }
}

/// Result of `PRAGMA integrity_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub healthy: bool,
    /// Raw rows returned by SQLite (`["ok"]` when healthy).
    pub messages: Vec<String>,
}

/// SQLite-backed task store.
#[derive(Debug)]
pub struct TodoStore {
    path: PathBuf,
    conn: Option<Connection>,
    state: ConnectionState,
    ids: Box<dyn IdGenerator>,
}

impl TodoStore {
    /// Create a store for `path` without opening it.
    ///
    /// The connection is opened by [`initialize`](Self::initialize) or lazily
    /// by the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ids: impl IdGenerator + 'static) -> Self {
        Self {
            path: path.into(),
            conn: None,
            state: ConnectionState::Uninitialized,
            ids: Box::new(ids),
        }
    }

    /// Open (or create) the database at `path` with wall-clock ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageInit` if the file cannot be opened or the
    /// schema statement fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, ClockIds::new())
    }

    /// Open (or create) the database at `path` with a custom id generator.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageInit` if the file cannot be opened or the
    /// schema statement fails.
    pub fn open_with(path: &Path, ids: impl IdGenerator + 'static) -> Result<Self> {
        let mut store = Self::new(path, ids);
        store.initialize()?;
        Ok(store)
    }

    /// Open the database file and ensure the schema exists.
    ///
    /// A no-op when a connection is already held. Also the recovery path
    /// after a failed reopen.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageInit` on any open or schema failure.
    pub fn initialize(&mut self) -> Result<()> {
        if self.conn.is_some() {
            debug!(path = %self.path.display(), "Store already initialized");
            return Ok(());
        }

        let conn = connect(&self.path)?;
        let existing_max: Option<i64> = conn
            .query_row("SELECT MAX(id) FROM todos", [], |row| row.get(0))
            .map_err(|e| storage_init(&self.path, &e))?;
        if let Some(max) = existing_max {
            self.ids.observe(max);
        }

        self.conn = Some(conn);
        self.set_state(ConnectionState::Open);
        info!(path = %self.path.display(), "Database initialized");
        Ok(())
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a live connection is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open && self.conn.is_some()
    }

    fn set_state(&mut self, next: ConnectionState) {
        debug!(from = %self.state, to = %next, "Connection state change");
        self.state = next;
    }

    /// Borrow the live connection, opening it first if never initialized.
    fn conn(&mut self) -> Result<&Connection> {
        if self.state == ConnectionState::Uninitialized {
            self.initialize()?;
        }

        match (self.state, self.conn.as_ref()) {
            (ConnectionState::Open, Some(conn)) => Ok(conn),
            (state, _) => Err(Error::ConnectionClosed { state }),
        }
    }

    /// Run one write in its own IMMEDIATE transaction.
    ///
    /// Engine failures surface as `Error::Write`; the transaction is
    /// rolled back so the table is untouched.
    fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> rusqlite::Result<R>,
    {
        self.conn()?;
        let Some(conn) = self.conn.as_mut() else {
            return Err(Error::ConnectionClosed { state: self.state });
        };

        let run = || -> rusqlite::Result<R> {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        };

        run().map_err(|e| {
            warn!(op, error = %e, "Write failed");
            Error::Write(e)
        })
    }

    // ===============
    // Task Operations
    // ===============

    /// Insert a task with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `Error::IdsExhausted` when the table already holds the
    /// largest possible id, or `Error::Write` on constraint violation or
    /// I/O failure.
    pub fn add(&mut self, title: &str) -> Result<Task> {
        // Open before drawing an id so the generator has seen existing rows.
        self.conn()?;
        let Some(id) = self.ids.next_id() else {
            let max: Option<i64> =
                self.conn()?
                    .query_row("SELECT MAX(id) FROM todos", [], |row| row.get(0))?;
            let max = max.unwrap_or(i64::MAX);
            warn!(max, "Task ids exhausted");
            return Err(Error::IdsExhausted { max });
        };
        self.add_with_id(id, title)
    }

    /// Insert a task with a caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the id already exists or the insert fails.
    pub fn add_with_id(&mut self, id: i64, title: &str) -> Result<Task> {
        self.mutate("add", |tx| {
            tx.execute(
                "INSERT INTO todos (id, title) VALUES (?1, ?2)",
                rusqlite::params![id, title],
            )
        })?;

        debug!(id, "Task added");
        Ok(Task::new(id, title))
    }

    /// Set the title of the task with `id`.
    ///
    /// Returns the number of rows changed; an unknown id changes nothing
    /// and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the update fails.
    pub fn update(&mut self, id: i64, title: &str) -> Result<usize> {
        let rows = self.mutate("update", |tx| {
            tx.execute(
                "UPDATE todos SET title = ?1 WHERE id = ?2",
                rusqlite::params![title, id],
            )
        })?;

        debug!(id, rows, "Task updated");
        Ok(rows)
    }

    /// Remove the task with `id`. An unknown id changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the delete fails.
    pub fn delete(&mut self, id: i64) -> Result<usize> {
        let rows = self.mutate("delete", |tx| {
            tx.execute("DELETE FROM todos WHERE id = ?1", [id])
        })?;

        debug!(id, rows, "Task deleted");
        Ok(rows)
    }

    /// Load every task.
    ///
    /// Rows come back ordered by id for stable output, but callers must not
    /// depend on any particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all(&mut self) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, title FROM todos ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Task {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        })?;

        let tasks = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&mut self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ===========
    // Diagnostics
    // ===========

    /// Run `PRAGMA integrity_check` over the database file.
    ///
    /// # Errors
    ///
    /// Returns `Error::IntegrityCheck` if the pragma itself cannot run.
    pub fn check_integrity(&mut self) -> Result<IntegrityReport> {
        let conn = self.conn()?;
        let messages =
            integrity_messages(conn).map_err(|e| Error::IntegrityCheck(e.to_string()))?;
        let healthy = messages.len() == 1 && messages[0] == "ok";

        if healthy {
            debug!("Integrity check passed");
        } else {
            warn!(?messages, "Integrity check reported problems");
        }

        Ok(IntegrityReport { healthy, messages })
    }

    /// Boolean form of [`check_integrity`](Self::check_integrity).
    ///
    /// A check that cannot run is logged and reported as unhealthy.
    pub fn is_healthy(&mut self) -> bool {
        match self.check_integrity() {
            Ok(report) => report.healthy,
            Err(e) => {
                warn!(error = %e, "Integrity check could not run");
                false
            }
        }
    }

    // ==================
    // Snapshot Lifecycle
    // ==================

    /// Flush the write-ahead log into the main database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma fails.
    pub fn checkpoint(&mut self) -> Result<CheckpointStats> {
        let conn = self.conn()?;
        let stats = conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |row| {
            Ok(CheckpointStats {
                busy: row.get::<_, i64>(0)? != 0,
                wal_frames: row.get(1)?,
                checkpointed_frames: row.get(2)?,
            })
        })?;

        if !stats.is_complete() {
            warn!(?stats, "Checkpoint did not complete");
        } else {
            debug!(?stats, "Checkpoint complete");
        }
        Ok(stats)
    }

    /// Close the live connection and hand back a guard that reopens it.
    ///
    /// While the guard exists the store is mutably borrowed, so no other
    /// operation can observe the closed connection.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionClosed` if the store is not open, or the
    /// engine error if closing fails (the connection is then kept).
    pub fn detach(&mut self) -> Result<DetachedStore<'_>> {
        if self.state != ConnectionState::Open {
            return Err(Error::ConnectionClosed { state: self.state });
        }
        let Some(conn) = self.conn.take() else {
            return Err(Error::ConnectionClosed { state: self.state });
        };

        self.set_state(ConnectionState::Closing);
        if let Err((conn, e)) = conn.close() {
            self.conn = Some(conn);
            self.set_state(ConnectionState::Open);
            return Err(Error::Database(e));
        }
        self.set_state(ConnectionState::Closed);
        info!(path = %self.path.display(), "Connection closed");

        Ok(DetachedStore::new(self))
    }

    /// Reopen after [`detach`](Self::detach).
    pub(crate) fn reattach(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        self.set_state(ConnectionState::Reopening);
        match connect(&self.path) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.set_state(ConnectionState::Open);
                info!(path = %self.path.display(), "Connection reopened");
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Closed);
                Err(e)
            }
        }
    }
}

/// Open a connection and apply the schema, mapping failures to `StorageInit`.
fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| storage_init(path, &e))?;
    }

    let conn = Connection::open(path).map_err(|e| storage_init(path, &e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| storage_init(path, &e))?;
    apply_schema(&conn).map_err(|e| storage_init(path, &e))?;
    Ok(conn)
}

fn storage_init(path: &Path, err: &dyn fmt::Display) -> Error {
    Error::StorageInit {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn integrity_messages(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let messages = rows.collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(messages)
}
