// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery status projection: one row per record id, overwritten on every transition.

use std::str::FromStr;

use convey_core::{ConveyError, DeliveryStatus, SyncState};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

type StatusRow = (String, String, Option<String>, String);

/// Overwrite the status for `status.record_id`.
pub async fn upsert_status(db: &Database, status: &DeliveryStatus) -> Result<(), ConveyError> {
    let record_id = status.record_id.clone();
    let state = status.state.to_string();
    let error = status.error.clone();
    let updated_at = format_ts(&status.updated_at);

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sync_status (record_id, state, error, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(record_id) DO UPDATE SET
                    state = excluded.state,
                    error = excluded.error,
                    updated_at = excluded.updated_at",
                params![record_id, state, error, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_status(db: &Database, record_id: &str) -> Result<Option<DeliveryStatus>, ConveyError> {
    let record_id = record_id.to_string();
    let row: Option<StatusRow> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT record_id, state, error, updated_at FROM sync_status WHERE record_id = ?1",
                params![record_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    row.map(from_row).transpose()
}

/// All statuses ordered by record id.
pub async fn list_statuses(db: &Database) -> Result<Vec<DeliveryStatus>, ConveyError> {
    let rows: Vec<StatusRow> = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT record_id, state, error, updated_at FROM sync_status ORDER BY record_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter().map(from_row).collect()
}

fn from_row((record_id, state, error, updated_at): StatusRow) -> Result<DeliveryStatus, ConveyError> {
    Ok(DeliveryStatus {
        record_id,
        state: SyncState::from_str(&state).map_err(ConveyError::storage)?,
        error,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_is_overwritten_not_appended() {
        let db = Database::open(":memory:").await.unwrap();
        upsert_status(&db, &DeliveryStatus::new("c1", SyncState::Syncing))
            .await
            .unwrap();
        upsert_status(
            &db,
            &DeliveryStatus::new("c1", SyncState::Error).with_error("backend sync failed: 500 - "),
        )
        .await
        .unwrap();

        let all = list_statuses(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state, SyncState::Error);
        assert_eq!(all[0].error.as_deref(), Some("backend sync failed: 500 - "));
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let db = Database::open(":memory:").await.unwrap();
        upsert_status(&db, &DeliveryStatus::new("c1", SyncState::Pending).with_error("timeout"))
            .await
            .unwrap();
        upsert_status(&db, &DeliveryStatus::new("c1", SyncState::Success))
            .await
            .unwrap();

        let status = get_status(&db, "c1").await.unwrap().unwrap();
        assert_eq!(status.state, SyncState::Success);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn statuses_are_listed_by_id() {
        let db = Database::open(":memory:").await.unwrap();
        for id in ["b", "c", "a"] {
            upsert_status(&db, &DeliveryStatus::new(id, SyncState::Success))
                .await
                .unwrap();
        }
        let ids: Vec<_> = list_statuses(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.record_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(get_status(&db, "z").await.unwrap().is_none());
    }
}
