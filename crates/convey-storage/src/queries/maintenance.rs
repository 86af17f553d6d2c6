// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention cleanup, size reporting, and full reset.

use chrono::{DateTime, Utc};
use convey_core::{ConveyError, StorageInfo};
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err};

/// Delete records last updated at or before `cutoff`, with their statuses.
///
/// Statuses with no record that were themselves last touched at or before
/// `cutoff` are removed too. Returns the number of records deleted.
pub async fn delete_older_than(db: &Database, cutoff: DateTime<Utc>) -> Result<usize, ConveyError> {
    let cutoff = format_ts(&cutoff);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM sync_status WHERE record_id IN
                    (SELECT id FROM conversations WHERE updated_at <= ?1)",
                params![cutoff],
            )?;
            let removed = tx.execute(
                "DELETE FROM conversations WHERE updated_at <= ?1",
                params![cutoff],
            )?;
            tx.execute(
                "DELETE FROM sync_status WHERE updated_at <= ?1
                    AND record_id NOT IN (SELECT id FROM conversations)",
                params![cutoff],
            )?;
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

/// Row counts and total payload size in bytes.
pub async fn storage_info(db: &Database) -> Result<StorageInfo, ConveyError> {
    db.connection()
        .call(|conn| {
            let (record_count, total_bytes): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(payload AS BLOB))), 0)
                 FROM conversations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let status_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM sync_status", [], |row| row.get(0))?;
            Ok(StorageInfo {
                record_count: record_count.max(0) as u64,
                status_count: status_count.max(0) as u64,
                total_bytes: total_bytes.max(0) as u64,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Remove every record, status, and stored setting in one transaction.
pub async fn clear_all(db: &Database) -> Result<(), ConveyError> {
    db.connection()
        .call(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM sync_status;
                 DELETE FROM conversations;
                 DELETE FROM settings;",
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
