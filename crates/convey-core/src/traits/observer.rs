// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer trait for delivery notifications.

use crate::types::SyncEvent;

/// Receives `SYNC_SUCCESS` / `SYNC_ERROR` notifications.
///
/// Fan-out is best-effort: implementations swallow their own failures, so a
/// notification can never fail a delivery task.
pub trait ObserverSink: Send + Sync + 'static {
    fn notify(&self, event: SyncEvent);
}
