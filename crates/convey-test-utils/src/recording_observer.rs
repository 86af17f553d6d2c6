// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer sink that records every event for later assertions.

use std::sync::Mutex;

use convey_core::{ObserverSink, SyncEvent, SyncEventKind};

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far, in arrival order.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Event kinds received for one record.
    pub fn kinds_for(&self, record_id: &str) -> Vec<SyncEventKind> {
        self.events()
            .into_iter()
            .filter(|e| e.record_id == record_id)
            .map(|e| e.kind)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl ObserverSink for RecordingObserver {
    fn notify(&self, event: SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
