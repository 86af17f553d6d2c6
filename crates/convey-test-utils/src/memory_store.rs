// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory local store with failure injection.
//!
//! Besides the current status per record, every status write is appended to
//! a history so tests can assert the exact state transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use convey_core::{
    Adapter, AdapterType, ConveyError, DeliveryStatus, HealthStatus, LocalStore, ProcessedRecord,
    StorageInfo, SyncSettings, SyncState,
};

#[derive(Default)]
struct Inner {
    records: HashMap<String, ProcessedRecord>,
    statuses: HashMap<String, DeliveryStatus>,
    history: Vec<DeliveryStatus>,
    settings: Option<SyncSettings>,
}

/// A [`LocalStore`] kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_persist: AtomicBool,
    fail_status: AtomicBool,
    fail_config: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `settings`.
    pub fn with_settings(settings: SyncSettings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                settings: Some(settings),
                ..Inner::default()
            }),
            ..Self::default()
        }
    }

    /// Make `persist` fail until reset.
    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Make `set_status` fail until reset.
    pub fn set_fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    /// Make `get_config` fail until reset.
    pub fn set_fail_config(&self, fail: bool) {
        self.fail_config.store(fail, Ordering::SeqCst);
    }

    /// Every status written, oldest first.
    pub async fn status_history(&self) -> Vec<DeliveryStatus> {
        self.inner.lock().await.history.clone()
    }

    /// Sequence of states written for one record.
    pub async fn states_for(&self, record_id: &str) -> Vec<SyncState> {
        self.inner
            .lock()
            .await
            .history
            .iter()
            .filter(|s| s.record_id == record_id)
            .map(|s| s.state)
            .collect()
    }

    pub async fn record_count(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Insert a record directly, bypassing failure injection.
    pub async fn insert(&self, record: ProcessedRecord) {
        self.inner
            .lock()
            .await
            .records
            .insert(record.id().to_string(), record);
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<(), ConveyError> {
        if flag.load(Ordering::SeqCst) {
            Err(ConveyError::storage(std::io::Error::other(format!(
                "injected {what} failure"
            ))))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Adapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ConveyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn persist(&self, record: &ProcessedRecord) -> Result<(), ConveyError> {
        Self::injected(&self.fail_persist, "persist")?;
        self.insert(record.clone()).await;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ProcessedRecord>, ConveyError> {
        Ok(self.inner.lock().await.records.get(id).cloned())
    }

    async fn get_all(&self) -> Result<HashMap<String, ProcessedRecord>, ConveyError> {
        Ok(self.inner.lock().await.records.clone())
    }

    async fn set_status(&self, status: &DeliveryStatus) -> Result<(), ConveyError> {
        Self::injected(&self.fail_status, "status")?;
        let mut inner = self.inner.lock().await;
        inner.history.push(status.clone());
        inner
            .statuses
            .insert(status.record_id.clone(), status.clone());
        Ok(())
    }

    async fn get_status(&self, record_id: &str) -> Result<Option<DeliveryStatus>, ConveyError> {
        Ok(self.inner.lock().await.statuses.get(record_id).cloned())
    }

    async fn list_statuses(&self) -> Result<Vec<DeliveryStatus>, ConveyError> {
        let mut statuses: Vec<_> = self.inner.lock().await.statuses.values().cloned().collect();
        statuses.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        Ok(statuses)
    }

    async fn get_config(&self) -> Result<Option<SyncSettings>, ConveyError> {
        Self::injected(&self.fail_config, "config")?;
        Ok(self.inner.lock().await.settings.clone())
    }

    async fn save_config(&self, settings: &SyncSettings) -> Result<(), ConveyError> {
        self.inner.lock().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ConveyError> {
        let mut inner = self.inner.lock().await;
        let expired: Vec<String> = inner
            .records
            .values()
            .filter(|r| r.record.updated_at <= cutoff)
            .map(|r| r.id().to_string())
            .collect();
        for id in &expired {
            inner.records.remove(id);
            inner.statuses.remove(id);
        }
        let Inner {
            records, statuses, ..
        } = &mut *inner;
        statuses.retain(|id, s| records.contains_key(id) || s.updated_at > cutoff);
        Ok(expired.len())
    }

    async fn storage_info(&self) -> Result<StorageInfo, ConveyError> {
        let inner = self.inner.lock().await;
        Ok(StorageInfo {
            record_count: inner.records.len() as u64,
            status_count: inner.statuses.len() as u64,
            total_bytes: 0,
        })
    }

    async fn clear_all(&self) -> Result<(), ConveyError> {
        let mut inner = self.inner.lock().await;
        inner.records.clear();
        inner.statuses.clear();
        inner.settings = None;
        Ok(())
    }
}
