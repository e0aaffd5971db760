// 💾 Snapshot Stores - save/load of the whole application state
//
// Two backends behind one trait:
// - JsonFileStore: one pretty-printed JSON document
// - SqliteStore: every save appends a row (WAL mode); load returns the latest.
//   Only the newest `history` rows are kept.

use crate::error::Result;
use crate::snapshot::AppState;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

pub trait SnapshotStore {
    fn save(&self, state: &AppState) -> Result<()>;

    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<AppState>>;
}

// ============================================================================
// JSON FILE
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        tracing::info!("Saved snapshot {} to {}", state.snapshot_id, self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<AppState>> {
        if !self.path.exists() {
            tracing::debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;
        let state: AppState = serde_json::from_str(&json)?;
        Ok(Some(state))
    }
}

// ============================================================================
// SQLITE
// ============================================================================

/// Rows kept by `SqliteStore` unless configured otherwise
pub const DEFAULT_HISTORY: usize = 20;

pub struct SqliteStore {
    conn: Connection,
    history: usize,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn,
            history: DEFAULT_HISTORY,
        })
    }

    /// Keep at most `history` snapshots (at least one).
    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history.max(1);
        self
    }

    fn prune(&self) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM snapshots WHERE id NOT IN (
                SELECT id FROM snapshots ORDER BY id DESC LIMIT ?1
            )",
            params![self.history as i64],
        )?;
        if removed > 0 {
            tracing::debug!("Pruned {} old snapshots", removed);
        }
        Ok(removed)
    }

    pub fn snapshot_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            snapshot_id TEXT UNIQUE NOT NULL,
            taken_at TEXT NOT NULL,
            students INTEGER NOT NULL,
            courses INTEGER NOT NULL,
            enrollments INTEGER NOT NULL,
            payload TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_taken_at ON snapshots(taken_at)",
        [],
    )?;

    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn save(&self, state: &AppState) -> Result<()> {
        let payload = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO snapshots (snapshot_id, taken_at, students, courses, enrollments, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                state.snapshot_id,
                state.taken_at.to_rfc3339(),
                state.students.len() as i64,
                state.courses.len() as i64,
                state.enrollments.len() as i64,
                payload,
            ],
        )?;
        self.prune()?;
        tracing::info!("Saved snapshot {} to sqlite", state.snapshot_id);
        Ok(())
    }

    fn load(&self) -> Result<Option<AppState>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
