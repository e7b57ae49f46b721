//! Dead Letter Queue
//!
//! Stores logs that failed permanently for later analysis and replay.

use betboard_core::{BoardError, EventPosition, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, block_number, transaction_index, log_index, raw_log, \
     error_kind, error_message, failed_at, retry_count FROM dead_letter_queue";

fn store_err(e: rusqlite::Error) -> BoardError {
    BoardError::Store(e.to_string())
}

/// Failed log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEvent {
    pub id: i64,
    /// `None` when the log could not be parsed far enough to know it.
    pub position: Option<EventPosition>,
    /// The log as received, usually one JSON line.
    pub raw_log: String,
    pub error_kind: String,
    pub error_message: String,
    pub failed_at: String,
    pub retry_count: u32,
}

impl FailedEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let block: Option<i64> = row.get(1)?;
        let tx: Option<i64> = row.get(2)?;
        let log: Option<i64> = row.get(3)?;
        let position = match (block, tx, log) {
            (Some(b), Some(t), Some(l)) => Some(EventPosition::new(b as u64, t as u64, l as u64)),
            _ => None,
        };
        Ok(Self {
            id: row.get(0)?,
            position,
            raw_log: row.get(4)?,
            error_kind: row.get(5)?,
            error_message: row.get(6)?,
            failed_at: row.get(7)?,
            retry_count: row.get(8)?,
        })
    }
}

/// Dead Letter Queue for storing failed logs
pub struct DeadLetterQueue {
    conn: Arc<Mutex<Connection>>,
}

impl DeadLetterQueue {
    /// Create a dead letter queue on `conn`, creating its table if needed
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        let dlq = Self { conn };
        dlq.init()?;
        Ok(dlq)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS dead_letter_queue (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    block_number INTEGER,
                    transaction_index INTEGER,
                    log_index INTEGER,
                    raw_log TEXT NOT NULL,
                    error_kind TEXT NOT NULL,
                    error_message TEXT NOT NULL,
                    failed_at TEXT NOT NULL,
                    retry_count INTEGER NOT NULL DEFAULT 0,
                    last_retry_at TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_dlq_position
                    ON dead_letter_queue(block_number, transaction_index, log_index);",
            )
            .map_err(store_err)
    }

    /// Add a failed log to the dead letter queue
    pub fn add(
        &self,
        position: Option<EventPosition>,
        raw_log: &str,
        error: &BoardError,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO dead_letter_queue
                (block_number, transaction_index, log_index, raw_log, error_kind, error_message, failed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                position.map(|p| p.block_number as i64),
                position.map(|p| p.transaction_index as i64),
                position.map(|p| p.log_index as i64),
                raw_log,
                error.kind(),
                error.to_string(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(store_err)?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a failed log by ID
    pub fn get(&self, id: i64) -> Result<Option<FailedEvent>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            [id],
            FailedEvent::from_row,
        )
        .optional()
        .map_err(store_err)
    }

    /// Most recent failures first
    pub fn list(&self, limit: usize) -> Result<Vec<FailedEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))
            .map_err(store_err)?;

        let events = stmt
            .query_map([limit as i64], FailedEvent::from_row)
            .map_err(store_err)?;

        events
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    /// Mark a failed log for retry
    pub fn mark_retry(&self, id: i64) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "UPDATE dead_letter_queue
                 SET retry_count = retry_count + 1,
                     last_retry_at = ?2
                 WHERE id = ?1",
                params![id, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(store_err)?;

        Ok(())
    }

    /// Remove a failed log from the queue
    pub fn remove(&self, id: i64) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM dead_letter_queue WHERE id = ?1", [id])
            .map_err(store_err)?;

        Ok(())
    }

    /// Get count of failed logs
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM dead_letter_queue", [], |row| {
                row.get(0)
            })
            .map_err(store_err)?;

        Ok(count as usize)
    }

    /// Clear all failed logs
    pub fn clear(&self) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM dead_letter_queue", [])
            .map_err(store_err)?;

        Ok(())
    }
}
