// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `ingest`, `sync-all`, `status`, `cleanup`, `config`.

use std::path::{Path, PathBuf};

use convey_config::ConveyConfig;
use convey_core::{ConveyError, DeliveryStatus, Record, SyncSettings};
use serde::Deserialize;
use tracing::warn;

use crate::runtime::Runtime;

/// Placeholder printed instead of a configured auth token.
const REDACTED: &str = "[REDACTED]";

/// A record file holds either one record or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<Record>),
    One(Box<Record>),
}

/// Load every record from `path`.
pub fn read_records(path: &Path) -> Result<Vec<Record>, ConveyError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ConveyError::InvalidRecord(format!("cannot read {}: {e}", path.display()))
    })?;
    let parsed: RecordFile = serde_json::from_str(&raw).map_err(|e| {
        ConveyError::InvalidRecord(format!("{} is not a conversation record: {e}", path.display()))
    })?;
    Ok(match parsed {
        RecordFile::Many(records) => records,
        RecordFile::One(record) => vec![*record],
    })
}

/// Capture every record in `files`, wait for delivery, and print the outcome.
///
/// Returns the number of records that ended in `error` or were rejected.
pub async fn run_ingest(config: &ConveyConfig, files: &[PathBuf]) -> Result<usize, ConveyError> {
    let mut records = Vec::new();
    for file in files {
        records.extend(read_records(file)?);
    }

    let runtime = Runtime::open(config).await?;
    runtime.service.start(&config.sync.to_settings()).await?;

    let mut accepted = Vec::new();
    let mut failures = 0;
    for record in records {
        let id = record.id.clone();
        match runtime.service.capture(record, None).await {
            Ok(_) => accepted.push(id),
            Err(e) => {
                warn!(record_id = %id, error = %e, "record rejected");
                println!("{id}\trejected\t{e}");
                failures += 1;
            }
        }
    }

    runtime.service.wait_idle().await;

    for id in &accepted {
        match runtime.service.status(id).await? {
            Some(status) => {
                if status.state == convey_core::SyncState::Error {
                    failures += 1;
                }
                println!("{}", format_status(&status));
            }
            None => println!("{id}\tunknown"),
        }
    }

    runtime.shutdown().await?;
    Ok(failures)
}

/// Re-deliver every stored record and wait until the queue is idle.
pub async fn run_sync_all(config: &ConveyConfig) -> Result<(), ConveyError> {
    let runtime = Runtime::open(config).await?;
    runtime.service.start(&config.sync.to_settings()).await?;

    let count = runtime.service.sync_all().await?;
    runtime.service.wait_idle().await;

    let statuses = runtime.service.statuses().await?;
    let failed = statuses
        .iter()
        .filter(|s| s.state == convey_core::SyncState::Error)
        .count();
    println!("re-enqueued {count} records, {failed} in error");

    runtime.shutdown().await
}

/// Print stored statuses, or a single one when `id` is given.
pub async fn run_status(
    config: &ConveyConfig,
    id: Option<&str>,
    json: bool,
) -> Result<(), ConveyError> {
    let runtime = Runtime::open(config).await?;
    let statuses = match id {
        Some(id) => runtime.service.status(id).await?.into_iter().collect(),
        None => runtime.service.statuses().await?,
    };

    if json {
        let rendered = serde_json::to_string_pretty(&statuses)
            .map_err(|e| ConveyError::Internal(format!("failed to encode statuses: {e}")))?;
        println!("{rendered}");
    } else if statuses.is_empty() {
        println!("no delivery statuses recorded");
    } else {
        for status in &statuses {
            println!("{}", format_status(status));
        }
    }

    runtime.shutdown().await
}

/// Apply the stored retention period once.
pub async fn run_cleanup(config: &ConveyConfig) -> Result<(), ConveyError> {
    let runtime = Runtime::open(config).await?;
    runtime.service.start(&config.sync.to_settings()).await?;
    let removed = runtime.service.cleanup().await?;
    let info = runtime.service.storage_info().await?;
    println!(
        "removed {removed} records; {} records and {} statuses remain ({} bytes)",
        info.record_count, info.status_count, info.total_bytes
    );
    runtime.shutdown().await
}

/// Print the effective file configuration and the stored sync settings.
pub async fn run_config(config: &ConveyConfig) -> Result<(), ConveyError> {
    let mut file = config.clone();
    if !file.sync.auth_token.is_empty() {
        file.sync.auth_token = REDACTED.to_string();
    }
    let rendered = toml::to_string_pretty(&file)
        .map_err(|e| ConveyError::Internal(format!("failed to render configuration: {e}")))?;
    println!("# effective configuration\n{rendered}");

    let runtime = Runtime::open(config).await?;
    let stored = runtime.service.settings().await?;
    let rendered = serde_json::to_string_pretty(&redacted(stored))
        .map_err(|e| ConveyError::Internal(format!("failed to render settings: {e}")))?;
    println!("# stored sync settings\n{rendered}");

    runtime.shutdown().await
}

fn redacted(mut settings: SyncSettings) -> SyncSettings {
    if !settings.auth_token.is_empty() {
        settings.auth_token = REDACTED.to_string();
    }
    settings
}

/// `id<TAB>state[<TAB>error]`.
pub fn format_status(status: &DeliveryStatus) -> String {
    match &status.error {
        Some(error) => format!("{}\t{}\t{}", status.record_id, status.state, error),
        None => format!("{}\t{}", status.record_id, status.state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convey_core::SyncState;

    const ONE: &str = r#"{
        "id": "a",
        "platform": "ChatGPT",
        "title": "t",
        "url": "https://chat.example.com/c/a",
        "createdAt": "2026-02-01T00:00:00.000Z",
        "updatedAt": "2026-02-01T00:00:00.000Z",
        "messages": []
    }"#;

    #[test]
    fn reads_single_record_and_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("one.json");
        std::fs::write(&single, ONE).unwrap();
        assert_eq!(read_records(&single).unwrap().len(), 1);

        let many = dir.path().join("many.json");
        std::fs::write(&many, format!("[{ONE}, {}]", ONE.replace("\"a\"", "\"b\""))).unwrap();
        let records = read_records(&many).unwrap();
        assert_eq!(
            records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn unreadable_or_invalid_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_records(&dir.path().join("missing.json")).is_err());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"id": 1}"#).unwrap();
        let err = read_records(&bad).unwrap_err();
        assert!(err.to_string().contains("is not a conversation record"));
    }

    #[test]
    fn status_lines_include_errors() {
        let ok = DeliveryStatus::new("a", SyncState::Success);
        assert_eq!(format_status(&ok), "a\tsuccess");
        let failed = DeliveryStatus::new("b", SyncState::Error).with_error("boom");
        assert_eq!(format_status(&failed), "b\terror\tboom");
    }

    #[test]
    fn token_is_redacted() {
        let settings = SyncSettings {
            auth_token: "secret".into(),
            ..SyncSettings::default()
        };
        assert_eq!(redacted(settings).auth_token, REDACTED);
        assert_eq!(redacted(SyncSettings::default()).auth_token, "");
    }
}
