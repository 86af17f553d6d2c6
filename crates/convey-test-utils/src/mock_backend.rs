// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote backend with scripted outcomes for deterministic queue tests.
//!
//! Outcomes are popped from a FIFO script; once it is empty every call
//! succeeds, unless the backend was built with [`MockBackend::always_failing`].

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use convey_core::{
    Adapter, AdapterType, ConveyError, DeliveryOutcome, HealthStatus, ProcessedRecord,
    RemoteBackend, SyncSettings,
};

/// One recorded call to [`RemoteBackend::deliver`].
#[derive(Debug, Clone)]
pub struct Attempt {
    pub record_id: String,
    /// Summary carried by the delivered record, to tell versions apart.
    pub summary: Option<String>,
    /// Tokio clock time of the call; exact under a paused runtime.
    pub at: Instant,
}

#[derive(Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<(), String>>>,
    fallback_error: Option<String>,
    latency: Option<Duration>,
    attempts: Mutex<Vec<Attempt>>,
}

impl MockBackend {
    /// A backend that accepts every delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that replays `outcomes` in order, then accepts everything.
    ///
    /// `Err(message)` becomes a delivery error carrying that message.
    pub fn with_outcomes(outcomes: Vec<Result<(), String>>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(outcomes)),
            ..Self::default()
        }
    }

    /// A backend that rejects every delivery with `message`.
    pub fn always_failing(message: impl Into<String>) -> Self {
        Self {
            fallback_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sleep this long inside every delivery call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().await.clone()
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }

    /// Gaps between consecutive attempts.
    pub async fn gaps(&self) -> Vec<Duration> {
        let attempts = self.attempts.lock().await;
        attempts
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }
}

#[async_trait]
impl Adapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, ConveyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn deliver(
        &self,
        record: &ProcessedRecord,
        _settings: &SyncSettings,
    ) -> Result<DeliveryOutcome, ConveyError> {
        self.attempts.lock().await.push(Attempt {
            record_id: record.id().to_string(),
            summary: record.summary.clone(),
            at: Instant::now(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().await.pop_front();
        let outcome = match (scripted, &self.fallback_error) {
            (Some(outcome), _) => outcome,
            (None, Some(message)) => Err(message.clone()),
            (None, None) => Ok(()),
        };
        outcome
            .map(|()| DeliveryOutcome::Delivered)
            .map_err(|message| ConveyError::delivery(message, None))
    }
}
