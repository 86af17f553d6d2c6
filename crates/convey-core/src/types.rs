// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the processing pipeline, the delivery queue, and the
//! collaborator adapters.
//!
//! All wire types serialize in camelCase so that the JSON delivered to the
//! remote backend (and accepted from capture sources) matches the
//! conversation schema the backend expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConveyError;

/// Free-form metadata attached to records, messages, and processed output.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Source identifier for conversations captured from ChatGPT.
pub const SOURCE_CHATGPT: &str = "ChatGPT";
/// Source identifier for conversations captured from Claude.
pub const SOURCE_CLAUDE: &str = "Claude";
/// Source identifier for conversations captured from Yiyan (ERNIE Bot).
pub const SOURCE_YIYAN: &str = "文心一言";
/// Source identifier for conversations captured from Tongyi Qianwen.
pub const SOURCE_TONGYI: &str = "通义千问";

/// Every source that ships with a dedicated processor.
pub const BUILTIN_SOURCES: [&str; 4] = [SOURCE_CHATGPT, SOURCE_CLAUDE, SOURCE_YIYAN, SOURCE_TONGYI];

/// Longest accepted auto-sync period: 30 days.
pub const MAX_SYNC_INTERVAL_SECS: u64 = 30 * 24 * 60 * 60;
/// Longest accepted retention period: 100 years.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Classification of a message's content, assigned by the capture source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    Text,
    Code,
    Image,
    Mixed,
}

/// A single message in a captured conversation.
///
/// `content` is plain text; HTML has already been stripped by the capture source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub content_type: ContentType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A captured conversation, prior to enrichment.
///
/// `id` is unique per source and session. A record must carry at least one
/// message to be eligible for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    /// Source identifier; selects the processor variant.
    #[serde(rename = "platform")]
    pub source: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Record {
    /// Returns `true` if the record has at least one message.
    pub fn is_eligible(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// A record enriched with derived metadata, tags, and a summary.
///
/// The wrapped record's `metadata` holds the derived metadata map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub processed: bool,
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ProcessedRecord {
    /// Stamps a record as processed without deriving anything from it.
    pub fn stamped(record: Record) -> Self {
        Self {
            record,
            processed: true,
            processed_at: Utc::now(),
            tags: None,
            summary: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Drops the enrichment and returns the underlying record, e.g. for re-delivery.
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// Delivery state of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncState {
    Pending,
    Syncing,
    Success,
    Error,
}

/// Current delivery status of one record identifier.
///
/// There is exactly one status per record; every transition overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatus {
    pub record_id: String,
    pub state: SyncState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryStatus {
    /// Creates a status stamped with the current time.
    pub fn new(record_id: impl Into<String>, state: SyncState) -> Self {
        Self {
            record_id: record_id.into(),
            state,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Runtime sync settings, persisted by the local store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Periodically re-deliver every stored record.
    pub auto_sync: bool,
    /// Auto-sync period in seconds.
    pub sync_interval: u64,
    /// Stored records older than this many days are removed by the cleanup timer.
    pub data_retention_days: u32,
    /// Backend base URL. Empty disables remote delivery.
    pub api_endpoint: String,
    /// Bearer token sent to the backend. Empty sends no credential.
    pub auth_token: String,
    /// Sources accepted at capture time.
    pub enabled_platforms: Vec<String>,
}

impl SyncSettings {
    /// Returns `true` if a non-blank backend endpoint is configured.
    pub fn has_endpoint(&self) -> bool {
        !self.api_endpoint.trim().is_empty()
    }

    pub fn is_platform_enabled(&self, source: &str) -> bool {
        self.enabled_platforms.iter().any(|p| p == source)
    }

    /// Check ranges and formats, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConveyError> {
        let mut problems = Vec::new();

        if !(1..=MAX_SYNC_INTERVAL_SECS).contains(&self.sync_interval) {
            problems.push(format!(
                "syncInterval must be between 1 and {MAX_SYNC_INTERVAL_SECS} seconds, got {}",
                self.sync_interval
            ));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.data_retention_days) {
            problems.push(format!(
                "dataRetentionDays must be between 1 and {MAX_RETENTION_DAYS}, got {}",
                self.data_retention_days
            ));
        }

        let endpoint = self.api_endpoint.trim();
        if !endpoint.is_empty()
            && !endpoint.starts_with("http://")
            && !endpoint.starts_with("https://")
        {
            problems.push(format!(
                "apiEndpoint `{endpoint}` must start with http:// or https://"
            ));
        }
        if self.enabled_platforms.iter().any(|p| p.trim().is_empty()) {
            problems.push("enabledPlatforms must not contain empty names".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConveyError::Config(problems.join("; ")))
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync: false,
            sync_interval: 300,
            data_retention_days: 30,
            api_endpoint: String::new(),
            auth_token: String::new(),
            enabled_platforms: BUILTIN_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl std::fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.auth_token.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("SyncSettings")
            .field("auto_sync", &self.auto_sync)
            .field("sync_interval", &self.sync_interval)
            .field("data_retention_days", &self.data_retention_days)
            .field("api_endpoint", &self.api_endpoint)
            .field("auth_token", &token)
            .field("enabled_platforms", &self.enabled_platforms)
            .finish()
    }
}

/// Opaque handle identifying where a capture came from (e.g. a browser tab).
///
/// Only used to route notifications back to the originating surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginContext(pub u64);

/// Kind of a delivery notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEventKind {
    SyncSuccess,
    SyncError,
}

/// Notification broadcast to observers when a task reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub kind: SyncEventKind,
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginContext>,
}

impl SyncEvent {
    pub fn success(record_id: impl Into<String>, origin: Option<OriginContext>) -> Self {
        Self {
            kind: SyncEventKind::SyncSuccess,
            record_id: record_id.into(),
            error: None,
            origin,
        }
    }

    pub fn error(
        record_id: impl Into<String>,
        error: impl Into<String>,
        origin: Option<OriginContext>,
    ) -> Self {
        Self {
            kind: SyncEventKind::SyncError,
            record_id: record_id.into(),
            error: Some(error.into()),
            origin,
        }
    }
}

/// Result of a successful call to a remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The backend accepted the record.
    Delivered,
    /// No endpoint is configured; delivery was skipped without a network call.
    Skipped,
}

/// Summary of what the local store currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub record_count: u64,
    pub status_count: u64,
    /// Approximate size of the stored record payloads in bytes.
    pub total_bytes: u64,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the collaborator role of an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    Backend,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        serde_json::from_value(serde_json::json!({
            "id": "conv-1",
            "platform": "ChatGPT",
            "title": "Sorting",
            "url": "https://chat.example.com/c/1",
            "createdAt": "2026-01-01T00:00:00.000Z",
            "updatedAt": "2026-01-01T00:05:00.000Z",
            "messages": [{
                "id": "m1",
                "role": "user",
                "content": "how to sort",
                "contentType": "text",
                "timestamp": "2026-01-01T00:00:00.000Z"
            }]
        }))
        .expect("record should deserialize")
    }

    #[test]
    fn record_uses_platform_on_the_wire() {
        let record = sample_record();
        assert_eq!(record.source, "ChatGPT");
        assert_eq!(record.messages[0].role, Role::User);
        assert_eq!(record.messages[0].content_type, ContentType::Text);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["platform"], "ChatGPT");
        assert!(json.get("source").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn processed_record_flattens_the_record() {
        let processed = ProcessedRecord {
            tags: Some(vec!["how to".into()]),
            summary: Some("how to sort".into()),
            ..ProcessedRecord::stamped(sample_record())
        };
        let json = serde_json::to_value(&processed).unwrap();
        assert_eq!(json["id"], "conv-1");
        assert_eq!(json["processed"], true);
        assert!(json.get("processedAt").is_some());
        assert_eq!(json["tags"][0], "how to");

        let back: ProcessedRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, processed);
    }

    #[test]
    fn empty_record_is_not_eligible() {
        let mut record = sample_record();
        assert!(record.is_eligible());
        record.messages.clear();
        assert!(!record.is_eligible());
    }

    #[test]
    fn sync_state_strings_are_lowercase() {
        use std::str::FromStr;
        assert_eq!(SyncState::Syncing.to_string(), "syncing");
        assert_eq!(SyncState::from_str("error").unwrap(), SyncState::Error);
        assert_eq!(
            serde_json::to_string(&SyncState::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn event_kinds_use_screaming_snake_case() {
        assert_eq!(SyncEventKind::SyncSuccess.to_string(), "SYNC_SUCCESS");
        let event = SyncEvent::error("conv-1", "boom", Some(OriginContext(7)));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "SYNC_ERROR");
        assert_eq!(json["recordId"], "conv-1");
        assert_eq!(json["origin"], 7);
    }

    #[test]
    fn default_settings_validate() {
        assert!(SyncSettings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let settings = SyncSettings {
            sync_interval: 0,
            data_retention_days: 100_000_000,
            api_endpoint: "sync.example.com".into(),
            ..SyncSettings::default()
        };
        let message = settings.validate().unwrap_err().to_string();
        assert!(message.contains("syncInterval"));
        assert!(message.contains("dataRetentionDays"));
        assert!(message.contains("apiEndpoint"));

        let zero_retention = SyncSettings {
            data_retention_days: 0,
            ..SyncSettings::default()
        };
        assert!(matches!(
            zero_retention.validate(),
            Err(ConveyError::Config(_))
        ));

        let upper = SyncSettings {
            sync_interval: MAX_SYNC_INTERVAL_SECS,
            data_retention_days: MAX_RETENTION_DAYS,
            api_endpoint: "https://sync.example.com".into(),
            ..SyncSettings::default()
        };
        assert!(upper.validate().is_ok());
    }

    #[test]
    fn default_settings_enable_builtin_sources() {
        let settings = SyncSettings::default();
        assert!(!settings.auto_sync);
        assert_eq!(settings.sync_interval, 300);
        assert_eq!(settings.data_retention_days, 30);
        assert!(!settings.has_endpoint());
        for source in BUILTIN_SOURCES {
            assert!(settings.is_platform_enabled(source));
        }
        assert!(!settings.is_platform_enabled("Gemini"));
    }

    #[test]
    fn blank_endpoint_counts_as_unconfigured() {
        let settings = SyncSettings {
            api_endpoint: "   ".into(),
            ..SyncSettings::default()
        };
        assert!(!settings.has_endpoint());
    }

    #[test]
    fn settings_debug_redacts_token() {
        let settings = SyncSettings {
            auth_token: "secret-token".into(),
            ..SyncSettings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn settings_round_trip_in_camel_case() {
        let json = serde_json::json!({
            "autoSync": true,
            "syncInterval": 60,
            "dataRetentionDays": 7,
            "apiEndpoint": "https://api.example.com",
            "authToken": "",
            "enabledPlatforms": ["Claude"]
        });
        let settings: SyncSettings = serde_json::from_value(json).unwrap();
        assert!(settings.auto_sync);
        assert_eq!(settings.sync_interval, 60);
        assert_eq!(settings.enabled_platforms, vec!["Claude"]);
    }
}
