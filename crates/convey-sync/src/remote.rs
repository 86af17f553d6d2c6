// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP remote backend.
//!
//! Each delivery is a single `POST {api_endpoint}/conversations` with the
//! processed record as a JSON body. Retries are the delivery queue's job;
//! this client never retries on its own.

use std::time::Duration;

use async_trait::async_trait;
use convey_core::{
    Adapter, AdapterType, ConveyError, DeliveryOutcome, HealthStatus, ProcessedRecord,
    RemoteBackend, SyncSettings,
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

/// Path appended to the configured endpoint.
const CONVERSATIONS_PATH: &str = "/conversations";

/// [`RemoteBackend`] that posts records to an HTTP endpoint.
///
/// The endpoint and token are read from the [`SyncSettings`] passed to each
/// call, so settings changes take effect on the next attempt.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConveyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConveyError::Delivery {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client })
    }
}

/// Joins the endpoint and the conversations path without doubling slashes.
pub fn conversations_url(endpoint: &str) -> String {
    let base = endpoint.trim().trim_end_matches('/');
    format!("{base}{CONVERSATIONS_PATH}")
}

#[async_trait]
impl Adapter for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, ConveyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RemoteBackend for HttpBackend {
    async fn deliver(
        &self,
        record: &ProcessedRecord,
        settings: &SyncSettings,
    ) -> Result<DeliveryOutcome, ConveyError> {
        if !settings.has_endpoint() {
            return Ok(DeliveryOutcome::Skipped);
        }

        let url = conversations_url(&settings.api_endpoint);
        let mut request = self.client.post(&url).json(record);

        let token = settings.auth_token.trim();
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ConveyError::Delivery {
            message: format!("HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(record_id = %record.id(), status = %status, url = %url, "backend responded");

        if status.is_success() {
            return Ok(DeliveryOutcome::Delivered);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ConveyError::delivery(
            format!("backend sync failed: {} - {}", status.as_u16(), body),
            Some(status.as_u16()),
        ))
    }
}
