//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Terminal (completed/interrupted) sessions, append-only
//! - Per-task completed pomodoro counters
//! - Key-value store for host state (the CLI keeps the manager snapshot here)

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::data_dir;
use super::migrations;
use super::store::SessionStore;
use crate::error::{GatewayError, StoreError};
use crate::session::{Session, SessionStatus, SessionType, TaskProgressGateway};

/// SQLite database for session storage.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/pomocycle.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("pomocycle.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        Ok(self.conn.lock()?)
    }

    /// Record a terminal session.
    ///
    /// # Errors
    /// Returns an error if the session is not terminal or the insert fails.
    pub fn record_session(&self, session: &Session) -> Result<(), StoreError> {
        if !session.is_terminal() {
            return Err(StoreError::Corrupt(format!(
                "refusing to store non-terminal session {} ({})",
                session.id,
                session.status.as_str()
            )));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (id, task_id, session_type, status, planned_duration,
                                   actual_duration, start_time, end_time, notes, pause_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                session.id,
                session.task_id,
                session.session_type.as_str(),
                session.status.as_str(),
                session.planned_duration as i64,
                session.actual_duration.map(|d| d as i64),
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                session.notes,
                session.pause_count,
            ],
        )?;
        Ok(())
    }

    pub fn sessions(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, session_type, status, planned_duration, actual_duration,
                    start_time, end_time, notes, pause_count
             FROM sessions
             ORDER BY start_time ASC",
        )?;
        let rows = stmt.query_map([], SessionRow::from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    /// Completed pomodoros credited to a task.
    pub fn task_pomodoros(&self, task_id: &str) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        let count = conn
            .query_row(
                "SELECT completed_pomodoros FROM task_progress WHERE task_id = ?1",
                params![task_id],
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    pub fn increment_task_pomodoros(&self, task_id: &str) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO task_progress (task_id, completed_pomodoros, updated_at)
             VALUES (?1, 1, ?2)
             ON CONFLICT(task_id) DO UPDATE SET
                completed_pomodoros = completed_pomodoros + 1,
                updated_at = excluded.updated_at",
            params![task_id, Utc::now().to_rfc3339()],
        )?;
        let count = conn.query_row(
            "SELECT completed_pomodoros FROM task_progress WHERE task_id = ?1",
            params![task_id],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn append(&self, session: &Session) -> Result<(), StoreError> {
        self.record_session(session)
    }

    fn query_all(&self) -> Result<Vec<Session>, StoreError> {
        self.sessions()
    }
}

impl TaskProgressGateway for Database {
    fn on_work_session_completed(&self, task_id: &str) -> Result<(), GatewayError> {
        self.increment_task_pomodoros(task_id)
            .map(|_| ())
            .map_err(|e| GatewayError::TaskProgress {
                task_id: task_id.to_string(),
                message: e.to_string(),
            })
    }
}

struct SessionRow {
    id: String,
    task_id: Option<String>,
    session_type: String,
    status: String,
    planned_duration: i64,
    actual_duration: Option<i64>,
    start_time: String,
    end_time: Option<String>,
    notes: Option<String>,
    pause_count: u32,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task_id: row.get(1)?,
            session_type: row.get(2)?,
            status: row.get(3)?,
            planned_duration: row.get(4)?,
            actual_duration: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            notes: row.get(8)?,
            pause_count: row.get(9)?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        let session_type = SessionType::parse(&self.session_type).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "session {}: unknown type '{}'",
                self.id, self.session_type
            ))
        })?;
        let status = SessionStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!("session {}: unknown status '{}'", self.id, self.status))
        })?;
        let start_time = parse_time(&self.id, &self.start_time)?;
        let end_time = self
            .end_time
            .as_deref()
            .map(|t| parse_time(&self.id, t))
            .transpose()?;
        Ok(Session {
            id: self.id,
            task_id: self.task_id,
            session_type,
            planned_duration: self.planned_duration.max(0) as u64,
            actual_duration: self.actual_duration.map(|d| d.max(0) as u64),
            start_time,
            end_time,
            status,
            notes: self.notes,
            pause_count: self.pause_count,
        })
    }
}

fn parse_time(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("session {id}: bad timestamp '{raw}': {e}")))
}
