// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use convey_core::types::{MAX_RETENTION_DAYS, MAX_SYNC_INTERVAL_SECS};

use crate::diagnostic::ConfigError;
use crate::model::ConveyConfig;

/// Largest accepted `queue.max_retries`; keeps `retry_delay_ms * 2^n` in range.
pub const MAX_RETRIES_LIMIT: u32 = 16;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ConveyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.daemon.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "daemon.log_level `{}` must be one of: {}",
            config.daemon.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.queue.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ConfigError::validation(format!(
            "queue.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
            config.queue.max_retries
        )));
    }

    if config.queue.retry_delay_ms == 0 {
        errors.push(ConfigError::validation(
            "queue.retry_delay_ms must be greater than 0",
        ));
    }

    if config.queue.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "queue.request_timeout_secs must be greater than 0",
        ));
    }

    if config.sync.sync_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "sync.sync_interval_secs must be greater than 0",
        ));
    } else if config.sync.sync_interval_secs > MAX_SYNC_INTERVAL_SECS {
        errors.push(ConfigError::validation(format!(
            "sync.sync_interval_secs must be at most {MAX_SYNC_INTERVAL_SECS}, got {}",
            config.sync.sync_interval_secs
        )));
    }

    if config.sync.data_retention_days == 0 {
        errors.push(ConfigError::validation(
            "sync.data_retention_days must be greater than 0",
        ));
    } else if config.sync.data_retention_days > MAX_RETENTION_DAYS {
        errors.push(ConfigError::validation(format!(
            "sync.data_retention_days must be at most {MAX_RETENTION_DAYS}, got {}",
            config.sync.data_retention_days
        )));
    }

    let endpoint = config.sync.api_endpoint.trim();
    if !endpoint.is_empty() && !endpoint.starts_with("http://") && !endpoint.starts_with("https://")
    {
        errors.push(ConfigError::validation(format!(
            "sync.api_endpoint `{endpoint}` must start with http:// or https://"
        )));
    }

    let mut seen = HashSet::new();
    for (i, platform) in config.sync.enabled_platforms.iter().enumerate() {
        if platform.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "sync.enabled_platforms[{i}] must not be empty"
            )));
        } else if !seen.insert(platform.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate platform `{platform}` in sync.enabled_platforms"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
