// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`LocalStore`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use convey_core::{
    Adapter, AdapterType, ConveyError, DeliveryStatus, HealthStatus, LocalStore, ProcessedRecord,
    StorageInfo, SyncSettings,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed local store.
///
/// The database is opened lazily by [`SqliteStore::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStore {
    path: String,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for `path` without opening it.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            db: OnceCell::new(),
        }
    }

    /// Create and initialize a store in one step.
    pub async fn open(path: impl Into<String>) -> Result<Self, ConveyError> {
        let store = Self::new(path);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), ConveyError> {
        let db = Database::open(&self.path).await?;
        self.db.set(db).map_err(|_| ConveyError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), ConveyError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn db(&self) -> Result<&Database, ConveyError> {
        self.db.get().ok_or_else(|| ConveyError::Storage {
            source: "store not initialized; call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ConveyError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("store not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn persist(&self, record: &ProcessedRecord) -> Result<(), ConveyError> {
        queries::records::upsert_record(self.db()?, record).await
    }

    async fn get(&self, id: &str) -> Result<Option<ProcessedRecord>, ConveyError> {
        queries::records::get_record(self.db()?, id).await
    }

    async fn get_all(&self) -> Result<HashMap<String, ProcessedRecord>, ConveyError> {
        queries::records::all_records(self.db()?).await
    }

    async fn set_status(&self, status: &DeliveryStatus) -> Result<(), ConveyError> {
        queries::statuses::upsert_status(self.db()?, status).await
    }

    async fn get_status(&self, record_id: &str) -> Result<Option<DeliveryStatus>, ConveyError> {
        queries::statuses::get_status(self.db()?, record_id).await
    }

    async fn list_statuses(&self) -> Result<Vec<DeliveryStatus>, ConveyError> {
        queries::statuses::list_statuses(self.db()?).await
    }

    async fn get_config(&self) -> Result<Option<SyncSettings>, ConveyError> {
        queries::settings::load_settings(self.db()?).await
    }

    async fn save_config(&self, settings: &SyncSettings) -> Result<(), ConveyError> {
        queries::settings::save_settings(self.db()?, settings).await
    }

    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ConveyError> {
        let removed = queries::maintenance::delete_older_than(self.db()?, cutoff).await?;
        info!(removed, cutoff = %cutoff, "retention cleanup complete");
        Ok(removed)
    }

    async fn storage_info(&self) -> Result<StorageInfo, ConveyError> {
        queries::maintenance::storage_info(self.db()?).await
    }

    async fn clear_all(&self) -> Result<(), ConveyError> {
        queries::maintenance::clear_all(self.db()?).await?;
        info!("all local data cleared");
        Ok(())
    }
}
