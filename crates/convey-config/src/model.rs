// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Convey daemon and CLI.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use convey_core::types::{BUILTIN_SOURCES, SyncSettings};
use serde::{Deserialize, Serialize};

/// Top-level Convey configuration.
///
/// Every section is optional and defaults to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConveyConfig {
    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Local store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Delivery queue retry and transport settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Initial sync settings, written to the store on first start.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("convey").join("convey.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("convey.db"))
        .to_string_lossy()
        .into_owned()
}

/// Delivery queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Retries allowed after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; retry N waits `retry_delay_ms * 2^(N-1)`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Timeout applied to each HTTP delivery request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Initial sync settings.
///
/// Only consulted while the store holds no settings; afterwards the stored
/// copy is authoritative and changes through `CONFIG_UPDATED`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Periodically re-deliver every stored record.
    #[serde(default)]
    pub auto_sync: bool,

    /// Auto-sync period in seconds.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Days to keep stored records before the cleanup timer removes them.
    #[serde(default = "default_data_retention_days")]
    pub data_retention_days: u32,

    /// Backend base URL. Empty disables remote delivery.
    #[serde(default)]
    pub api_endpoint: String,

    /// Bearer token for the backend. Empty sends no credential.
    #[serde(default)]
    pub auth_token: String,

    /// Sources accepted at capture time.
    #[serde(default = "default_enabled_platforms")]
    pub enabled_platforms: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: false,
            sync_interval_secs: default_sync_interval_secs(),
            data_retention_days: default_data_retention_days(),
            api_endpoint: String::new(),
            auth_token: String::new(),
            enabled_platforms: default_enabled_platforms(),
        }
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Same shape as the runtime settings, including token redaction.
        std::fmt::Debug::fmt(&self.to_settings(), f)
    }
}

impl SyncConfig {
    /// Converts the file section into the runtime settings stored by the local store.
    pub fn to_settings(&self) -> SyncSettings {
        SyncSettings {
            auto_sync: self.auto_sync,
            sync_interval: self.sync_interval_secs,
            data_retention_days: self.data_retention_days,
            api_endpoint: self.api_endpoint.clone(),
            auth_token: self.auth_token.clone(),
            enabled_platforms: self.enabled_platforms.clone(),
        }
    }
}

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_data_retention_days() -> u32 {
    30
}

fn default_enabled_platforms() -> Vec<String> {
    BUILTIN_SOURCES.iter().map(|s| s.to_string()).collect()
}
