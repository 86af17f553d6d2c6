// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background timers: periodic auto-sync and data-retention cleanup.
//!
//! Both loops hang off a child of the scheduler's root cancellation token.
//! Re-arming cancels the current child before spawning fresh loops, so at
//! most one generation of timers is ever live.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use convey_core::{ConveyError, LocalStore, SyncSettings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::DeliveryQueue;

/// Period of the data-retention cleanup loop.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Owns the auto-sync and cleanup loops.
pub struct SyncScheduler {
    queue: Arc<DeliveryQueue>,
    store: Arc<dyn LocalStore>,
    root: CancellationToken,
    armed: Mutex<Option<CancellationToken>>,
}

impl SyncScheduler {
    pub fn new(queue: Arc<DeliveryQueue>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            queue,
            store,
            root: CancellationToken::new(),
            armed: Mutex::new(None),
        }
    }

    /// Cancel any running timers, then arm new ones from `settings`.
    ///
    /// Auto-sync runs only when `auto_sync` is set; cleanup always runs.
    /// Each loop first fires one full period after arming.
    pub fn arm(&self, settings: &SyncSettings) {
        let token = self.root.child_token();
        if let Ok(mut armed) = self.armed.lock()
            && let Some(previous) = armed.replace(token.clone())
        {
            previous.cancel();
        }

        if settings.auto_sync {
            let period = Duration::from_secs(settings.sync_interval.max(1));
            let queue = Arc::clone(&self.queue);
            spawn_periodic(token.clone(), period, "auto-sync", move || {
                let queue = Arc::clone(&queue);
                async move {
                    match queue.sync_all().await {
                        Ok(count) => debug!(count, "auto-sync enqueued stored records"),
                        Err(e) => warn!(error = %e, "auto-sync failed (non-fatal)"),
                    }
                }
            });
        }

        let store = Arc::clone(&self.store);
        let retention_days = settings.data_retention_days;
        spawn_periodic(token, CLEANUP_INTERVAL, "cleanup", move || {
            let store = Arc::clone(&store);
            async move {
                if let Err(e) = cleanup_once(store.as_ref(), retention_days).await {
                    warn!(error = %e, "scheduled cleanup failed (non-fatal)");
                }
            }
        });

        info!(
            auto_sync = settings.auto_sync,
            sync_interval_secs = settings.sync_interval,
            data_retention_days = settings.data_retention_days,
            "background timers armed"
        );
    }

    /// Cancel the running timers without arming new ones.
    pub fn disarm(&self) {
        if let Ok(mut armed) = self.armed.lock()
            && let Some(previous) = armed.take()
        {
            previous.cancel();
            debug!("background timers disarmed");
        }
    }

    /// Cancel every timer for good.
    pub fn shutdown(&self) {
        self.root.cancel();
        if let Ok(mut armed) = self.armed.lock() {
            armed.take();
        }
    }
}

/// Remove records older than `retention_days`. Returns how many were removed.
///
/// A period of zero days, or one reaching before the earliest representable
/// timestamp, is rejected without touching the store.
pub async fn cleanup_once(
    store: &dyn LocalStore,
    retention_days: u32,
) -> Result<usize, ConveyError> {
    if retention_days == 0 {
        return Err(ConveyError::Config(
            "retention period must be at least one day".into(),
        ));
    }
    let cutoff = chrono::Duration::try_days(i64::from(retention_days))
        .and_then(|period| Utc::now().checked_sub_signed(period))
        .ok_or_else(|| {
            ConveyError::Config(format!(
                "retention period of {retention_days} days is out of range"
            ))
        })?;
    let removed = store.cleanup_older_than(cutoff).await?;
    info!(removed, retention_days, "retention cleanup finished");
    Ok(removed)
}

fn spawn_periodic<F, Fut>(
    token: CancellationToken,
    period: Duration,
    name: &'static str,
    mut tick: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => tick().await,
                _ = token.cancelled() => {
                    debug!(timer = name, "timer cancelled");
                    break;
                }
            }
        }
    });
}
