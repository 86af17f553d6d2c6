// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the asynchronous collaborators.

use async_trait::async_trait;

use crate::error::ConveyError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and health reporting for a store or backend implementation.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the collaborator role this adapter fills.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ConveyError>;
}
