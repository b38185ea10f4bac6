//! SQLite-backed storage.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{PendingCallStorage, Result};
use crate::call::PendingCall;

/// The table and index, created lazily on first use.
const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS _rpc_pending_calls (
  id         TEXT PRIMARY KEY NOT NULL,
  method     TEXT NOT NULL,
  params     TEXT NOT NULL,
  callback   TEXT NOT NULL,
  sent_at    INTEGER NOT NULL,
  timeout_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx__rpc_pending_calls_timeout
  ON _rpc_pending_calls(timeout_at);
";

/// SQLite-backed pending-call storage.
///
/// The connection is wrapped in a mutex (`rusqlite::Connection` is not
/// `Sync`); every operation is a single statement, so each is transactional
/// per call. The `params` column stores the request params as a JSON string.
pub struct SqliteCallStorage {
    conn: Mutex<Connection>,
    schema_ready: AtomicBool,
}

impl SqliteCallStorage {
    /// Opens (or creates) the database file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::wrap(Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::wrap(Connection::open_in_memory()?))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            schema_ready: AtomicBool::new(false),
        }
    }

    fn ensure_schema(&self, conn: &Connection) -> Result<()> {
        if !self.schema_ready.load(Ordering::Acquire) {
            conn.execute_batch(SCHEMA)?;
            self.schema_ready.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn row_to_call(row: &rusqlite::Row<'_>) -> rusqlite::Result<(PendingCall, String)> {
        let params_text: String = row.get(2)?;
        Ok((
            PendingCall {
                id: row.get(0)?,
                method: row.get(1)?,
                params: serde_json::Value::Null,
                callback: row.get(3)?,
                sent_at: row.get::<_, i64>(4)? as u64,
                timeout_at: row.get::<_, i64>(5)? as u64,
            },
            params_text,
        ))
    }

    fn decode(pair: (PendingCall, String)) -> Result<PendingCall> {
        let (mut call, params_text) = pair;
        call.params = serde_json::from_str(&params_text)?;
        Ok(call)
    }
}

impl PendingCallStorage for SqliteCallStorage {
    fn save(&self, call: &PendingCall) -> Result<()> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        let params_text = serde_json::to_string(&call.params)?;
        conn.execute(
            "INSERT OR REPLACE INTO _rpc_pending_calls
               (id, method, params, callback, sent_at, timeout_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                call.id,
                call.method,
                params_text,
                call.callback,
                call.sent_at as i64,
                call.timeout_at as i64,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PendingCall>> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        let row = conn
            .query_row(
                "SELECT id, method, params, callback, sent_at, timeout_at
                 FROM _rpc_pending_calls WHERE id = ?1",
                params![id],
                Self::row_to_call,
            )
            .optional()?;
        row.map(Self::decode).transpose()
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        let deleted = conn.execute("DELETE FROM _rpc_pending_calls WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_expired(&self, before_ms: u64) -> Result<Vec<PendingCall>> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, method, params, callback, sent_at, timeout_at
             FROM _rpc_pending_calls
             WHERE timeout_at <= ?1
             ORDER BY timeout_at ASC",
        )?;
        let rows = stmt.query_map(params![before_ms as i64], Self::row_to_call)?;
        rows.map(|pair| Self::decode(pair?)).collect()
    }

    fn list_all(&self) -> Result<Vec<PendingCall>> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, method, params, callback, sent_at, timeout_at
             FROM _rpc_pending_calls
             ORDER BY sent_at ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_call)?;
        rows.map(|pair| Self::decode(pair?)).collect()
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        self.ensure_schema(&conn)?;
        conn.execute("DELETE FROM _rpc_pending_calls", [])?;
        Ok(())
    }
}
