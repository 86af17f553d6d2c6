// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote backend trait for delivering processed records.

use async_trait::async_trait;

use crate::error::ConveyError;
use crate::traits::adapter::Adapter;
use crate::types::{DeliveryOutcome, ProcessedRecord, SyncSettings};

/// Delivers processed records to a remote system.
///
/// Implementations must return [`DeliveryOutcome::Skipped`] without any
/// network activity when `settings` carries no endpoint. Any transport
/// failure or non-2xx response is reported as [`ConveyError::Delivery`].
#[async_trait]
pub trait RemoteBackend: Adapter {
    /// Attempts one delivery of `record` using the current sync settings.
    async fn deliver(
        &self,
        record: &ProcessedRecord,
        settings: &SyncSettings,
    ) -> Result<DeliveryOutcome, ConveyError>;
}
