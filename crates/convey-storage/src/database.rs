// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: opening, PRAGMA setup, migrations, and shutdown.
//!
//! Every statement runs on tokio-rusqlite's single background thread, so
//! writes are serialized without extra locking. Open one [`Database`] per file.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use convey_core::ConveyError;
use tracing::debug;

use crate::migrations;

/// Busy timeout applied to the connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run migrations.
    ///
    /// Missing parent directories are created. `":memory:"` opens a private
    /// in-memory database.
    pub async fn open(path: &str) -> Result<Self, ConveyError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ConveyError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(ConveyError::storage)?;

        conn.call(|conn| -> Result<(), ConveyError> {
            let mode: String = conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                .map_err(ConveyError::storage)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(ConveyError::storage)?;
            conn.busy_timeout(BUSY_TIMEOUT)
                .map_err(ConveyError::storage)?;
            debug!(journal_mode = %mode, "sqlite pragmas applied");
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_call_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), ConveyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(ConveyError::storage)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error wrapping a rusqlite error into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ConveyError {
    ConveyError::storage(e)
}

/// Unwrap a closure's own [`ConveyError`]; connection failures become storage errors.
fn flatten_call_err(e: tokio_rusqlite::Error<ConveyError>) -> ConveyError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => ConveyError::storage(other),
    }
}

/// Canonical text form of stored timestamps; sorts chronologically as text.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, ConveyError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(ConveyError::storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("convey.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('conversations', 'sync_status', 'settings') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["conversations", "settings", "sync_status"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_runs_migrations_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("convey.db");
        let path = path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        let applied: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM refinery_schema_history",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let ts = DateTime::parse_from_rfc3339("2026-03-01T12:30:45.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = format_ts(&ts);
        assert_eq!(text, "2026-03-01T12:30:45.123Z");
        assert_eq!(parse_ts(&text).unwrap(), ts);
    }
}
