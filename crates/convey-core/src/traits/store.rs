// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local store trait for processed records, delivery statuses, and settings.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ConveyError;
use crate::traits::adapter::Adapter;
use crate::types::{DeliveryStatus, ProcessedRecord, StorageInfo, SyncSettings};

/// Durable local persistence.
///
/// Every write must be complete when the returned future resolves; readers
/// never observe a partially written record.
#[async_trait]
pub trait LocalStore: Adapter {
    /// Stores a processed record, replacing any previous version with the same id.
    async fn persist(&self, record: &ProcessedRecord) -> Result<(), ConveyError>;

    /// Fetches one processed record by id.
    async fn get(&self, id: &str) -> Result<Option<ProcessedRecord>, ConveyError>;

    /// Returns every stored record keyed by id.
    async fn get_all(&self) -> Result<HashMap<String, ProcessedRecord>, ConveyError>;

    /// Overwrites the current status for `status.record_id`.
    async fn set_status(&self, status: &DeliveryStatus) -> Result<(), ConveyError>;

    async fn get_status(&self, record_id: &str) -> Result<Option<DeliveryStatus>, ConveyError>;

    /// Returns every stored status, ordered by record id.
    async fn list_statuses(&self) -> Result<Vec<DeliveryStatus>, ConveyError>;

    /// Returns the stored sync settings, or `None` before the first save.
    async fn get_config(&self) -> Result<Option<SyncSettings>, ConveyError>;

    async fn save_config(&self, settings: &SyncSettings) -> Result<(), ConveyError>;

    /// Removes records last updated at or before `cutoff`, their statuses, and
    /// orphaned statuses no newer than `cutoff`. Returns the number of records removed.
    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ConveyError>;

    async fn storage_info(&self) -> Result<StorageInfo, ConveyError>;

    /// Removes every record, status, and stored setting.
    async fn clear_all(&self) -> Result<(), ConveyError>;
}
