//! SQLite output backend (feature `sqlite`).
//!
//! Writes every event to an `events` table:
//!
//! ```sql
//! CREATE TABLE events (seq INTEGER PRIMARY KEY, time REAL NOT NULL, event TEXT NOT NULL)
//! ```
//!
//! `seq` preserves arrival order when several events share a timestamp.

use std::path::Path;

use cx_core::EventTime;
use rusqlite::Connection;

use crate::sink::EventSink;
use crate::{EventRow, OutputError, OutputResult};

/// Writes recorded events to an SQLite database.
pub struct SqliteEventWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteEventWriter {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn create(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 seq   INTEGER PRIMARY KEY,
                 time  REAL    NOT NULL,
                 event TEXT    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl EventSink for SqliteEventWriter {
    fn write_events(&mut self, events: &[EventTime]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        if events.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached("INSERT INTO events (time, event) VALUES (?1, ?2)")?;
            for event in events {
                let row = EventRow::from(event);
                stmt.execute(rusqlite::params![row.time, row.event])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
