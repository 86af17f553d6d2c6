// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of delivery notifications over a tokio broadcast channel.

use convey_core::{ObserverSink, SyncEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of events a slow subscriber may lag behind.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// [`ObserverSink`] that republishes every event to all current subscribers.
///
/// Having no subscribers is not an error; the event is dropped. A subscriber
/// that falls more than `capacity` events behind loses the oldest ones.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<SyncEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl ObserverSink for BroadcastObserver {
    fn notify(&self, event: SyncEvent) {
        let record_id = event.record_id.clone();
        let kind = event.kind;
        if self.tx.send(event).is_err() {
            debug!(record_id = %record_id, kind = %kind, "no subscribers for sync event");
        }
    }
}
