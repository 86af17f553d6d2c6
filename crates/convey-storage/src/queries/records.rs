// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed-record persistence.
//!
//! Records are stored as their camelCase JSON payload; the indexed columns
//! are denormalized copies used for lookups and retention.

use std::collections::HashMap;

use convey_core::{ConveyError, ProcessedRecord};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};

/// Insert or replace a processed record.
pub async fn upsert_record(db: &Database, record: &ProcessedRecord) -> Result<(), ConveyError> {
    let id = record.id().to_string();
    let platform = record.record.source.clone();
    let updated_at = format_ts(&record.record.updated_at);
    let payload = serde_json::to_string(record).map_err(ConveyError::storage)?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, platform, payload, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    platform = excluded.platform,
                    payload = excluded.payload,
                    updated_at = excluded.updated_at,
                    stored_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, platform, payload, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one record by id.
pub async fn get_record(db: &Database, id: &str) -> Result<Option<ProcessedRecord>, ConveyError> {
    let id = id.to_string();
    let payload: Option<String> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT payload FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    payload.as_deref().map(decode).transpose()
}

/// Fetch every stored record keyed by id.
pub async fn all_records(db: &Database) -> Result<HashMap<String, ProcessedRecord>, ConveyError> {
    let rows: Vec<(String, String)> = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, payload FROM conversations ORDER BY id")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter()
        .map(|(id, payload)| Ok((id, decode(&payload)?)))
        .collect()
}

fn decode(payload: &str) -> Result<ProcessedRecord, ConveyError> {
    serde_json::from_str(payload).map_err(ConveyError::storage)
}
