// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored sync settings, kept as one JSON document.

use convey_core::{ConveyError, SyncSettings};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Settings row key.
const SYNC_SETTINGS_KEY: &str = "sync";

pub async fn load_settings(db: &Database) -> Result<Option<SyncSettings>, ConveyError> {
    let raw: Option<String> = db
        .connection()
        .call(|conn| {
            conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SYNC_SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    raw.map(|value| serde_json::from_str(&value).map_err(ConveyError::storage))
        .transpose()
}

pub async fn save_settings(db: &Database, settings: &SyncSettings) -> Result<(), ConveyError> {
    let value = serde_json::to_string(settings).map_err(ConveyError::storage)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![SYNC_SETTINGS_KEY, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
