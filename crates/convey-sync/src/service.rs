// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service facade over the delivery queue, the local store, and the timers.

use std::sync::Arc;

use convey_core::{
    ConveyError, DeliveryStatus, LocalStore, ObserverSink, OriginContext, ProcessedRecord, Record,
    RemoteBackend, StorageInfo, SyncSettings,
};
use convey_process::ProcessingPipeline;
use tracing::{debug, info};

use crate::backoff::RetryPolicy;
use crate::queue::DeliveryQueue;
use crate::scheduler::{SyncScheduler, cleanup_once};

/// Entry point used by the daemon and the CLI.
///
/// Owns the delivery queue and the background timers. Settings are always
/// read from the local store, so the store is the single source of truth.
pub struct SyncService {
    store: Arc<dyn LocalStore>,
    queue: Arc<DeliveryQueue>,
    scheduler: SyncScheduler,
}

impl SyncService {
    /// Spawn the queue worker. Timers stay idle until [`SyncService::start`].
    pub fn new(
        store: Arc<dyn LocalStore>,
        backend: Arc<dyn RemoteBackend>,
        observer: Arc<dyn ObserverSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self::with_pipeline(store, backend, observer, policy, ProcessingPipeline::default())
    }

    pub fn with_pipeline(
        store: Arc<dyn LocalStore>,
        backend: Arc<dyn RemoteBackend>,
        observer: Arc<dyn ObserverSink>,
        policy: RetryPolicy,
        pipeline: ProcessingPipeline,
    ) -> Self {
        let queue = Arc::new(DeliveryQueue::spawn(
            pipeline,
            Arc::clone(&store),
            backend,
            observer,
            policy,
        ));
        let scheduler = SyncScheduler::new(Arc::clone(&queue), Arc::clone(&store));
        Self {
            store,
            queue,
            scheduler,
        }
    }

    /// Load stored settings, seeding them with `initial` on first start, and
    /// arm the background timers.
    pub async fn start(&self, initial: &SyncSettings) -> Result<SyncSettings, ConveyError> {
        let settings = match self.store.get_config().await? {
            Some(stored) => stored,
            None => {
                info!("no stored sync settings, seeding from configuration");
                self.store.save_config(initial).await?;
                initial.clone()
            }
        };
        self.scheduler.arm(&settings);
        Ok(settings)
    }

    /// Validate and enqueue a freshly captured record. Returns the task id.
    pub async fn capture(
        &self,
        record: Record,
        origin: Option<OriginContext>,
    ) -> Result<String, ConveyError> {
        if !record.is_eligible() {
            return Err(ConveyError::InvalidRecord(format!(
                "conversation `{}` has no messages",
                record.id
            )));
        }

        let settings = self.settings().await?;
        if !settings.is_platform_enabled(&record.source) {
            debug!(record_id = %record.id, source = %record.source, "capture rejected");
            return Err(ConveyError::SourceDisabled(record.source));
        }

        self.queue.enqueue(record, origin)
    }

    pub async fn sync_all(&self) -> Result<usize, ConveyError> {
        self.queue.sync_all().await
    }

    pub async fn statuses(&self) -> Result<Vec<DeliveryStatus>, ConveyError> {
        self.store.list_statuses().await
    }

    pub async fn status(&self, record_id: &str) -> Result<Option<DeliveryStatus>, ConveyError> {
        self.store.get_status(record_id).await
    }

    pub async fn record(&self, record_id: &str) -> Result<Option<ProcessedRecord>, ConveyError> {
        self.store.get(record_id).await
    }

    /// Current sync settings, or the defaults if none were ever stored.
    pub async fn settings(&self) -> Result<SyncSettings, ConveyError> {
        Ok(self.store.get_config().await?.unwrap_or_default())
    }

    /// Validate and persist new settings, then re-arm the timers with them.
    ///
    /// Rejected settings leave the stored ones and the armed timers untouched.
    pub async fn update_settings(&self, settings: SyncSettings) -> Result<(), ConveyError> {
        settings.validate()?;
        self.store.save_config(&settings).await?;
        self.scheduler.arm(&settings);
        info!(?settings, "sync settings updated");
        Ok(())
    }

    /// Run retention cleanup once with the stored retention period.
    pub async fn cleanup(&self) -> Result<usize, ConveyError> {
        let settings = self.settings().await?;
        cleanup_once(self.store.as_ref(), settings.data_retention_days).await
    }

    pub async fn storage_info(&self) -> Result<StorageInfo, ConveyError> {
        self.store.storage_info().await
    }

    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    /// Cancel the timers and stop the queue worker.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown();
        self.queue.shutdown().await;
    }
}
