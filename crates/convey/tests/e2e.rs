// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete ingestion pipeline.
//!
//! Each test uses its own SQLite file in a temp directory and its own mock
//! HTTP backend. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use convey_core::types::{SOURCE_TONGYI, SOURCE_YIYAN};
use convey_core::{ConveyError, LocalStore, Role, SyncEventKind, SyncSettings, SyncState};
use convey_storage::SqliteStore;
use convey_sync::{BroadcastObserver, HttpBackend, RetryPolicy, SyncService};
use convey_test_utils::fixtures::{message, record, sample_record};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _dir: TempDir,
    db_path: String,
    store: Arc<SqliteStore>,
    observer: BroadcastObserver,
    service: SyncService,
}

impl Harness {
    async fn new(settings: SyncSettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("convey.db").to_string_lossy().into_owned();
        let store = Arc::new(SqliteStore::open(db_path.clone()).await.unwrap());
        let observer = BroadcastObserver::default();
        let service = SyncService::new(
            store.clone(),
            Arc::new(HttpBackend::new(Duration::from_secs(5)).unwrap()),
            Arc::new(observer.clone()),
            RetryPolicy::new(2, Duration::from_millis(10)),
        );
        service.start(&settings).await.unwrap();
        Self {
            _dir: dir,
            db_path,
            store,
            observer,
            service,
        }
    }

    async fn close(self) -> (TempDir, String) {
        self.service.shutdown().await;
        self.store.close().await.unwrap();
        (self._dir, self.db_path)
    }
}

fn pointing_at(server: &MockServer) -> SyncSettings {
    SyncSettings {
        api_endpoint: server.uri(),
        ..SyncSettings::default()
    }
}

// ---- Delivery pipeline ----

#[tokio::test]
async fn captured_record_is_stored_and_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(pointing_at(&server)).await;
    let mut events = harness.observer.subscribe();

    harness
        .service
        .capture(sample_record("c1"), Some(convey_core::OriginContext(7)))
        .await
        .unwrap();
    harness.service.wait_idle().await;

    let stored = harness.store.get("c1").await.unwrap().unwrap();
    assert!(stored.processed);
    assert_eq!(stored.summary.as_deref(), Some("how to reverse a list?"));
    assert_eq!(
        harness.store.get_status("c1").await.unwrap().unwrap().state,
        SyncState::Success
    );

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, SyncEventKind::SyncSuccess);
    assert_eq!(event.origin, Some(convey_core::OriginContext(7)));

    harness.close().await;
}

#[tokio::test]
async fn failed_delivery_is_persisted_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let harness = Harness::new(pointing_at(&server)).await;
    harness.service.capture(sample_record("c1"), None).await.unwrap();
    harness.service.wait_idle().await;

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    let (dir, db_path) = harness.close().await;

    // Statuses survive a restart.
    let reopened = SqliteStore::open(db_path).await.unwrap();
    let status = reopened.get_status("c1").await.unwrap().unwrap();
    assert_eq!(status.state, SyncState::Error);
    assert_eq!(status.error.as_deref(), Some("backend sync failed: 401 - bad token"));
    assert!(reopened.get("c1").await.unwrap().is_some());
    reopened.close().await.unwrap();
    drop(dir);
}

#[tokio::test]
async fn without_endpoint_records_are_only_stored() {
    let harness = Harness::new(SyncSettings::default()).await;
    harness.service.capture(sample_record("c1"), None).await.unwrap();
    harness.service.wait_idle().await;

    assert_eq!(
        harness.service.status("c1").await.unwrap().unwrap().state,
        SyncState::Success
    );
    assert_eq!(harness.service.storage_info().await.unwrap().record_count, 1);
    harness.close().await;
}

// ---- Source processors ----

#[tokio::test]
async fn yiyan_placeholders_are_normalized_before_storage() {
    let harness = Harness::new(SyncSettings::default()).await;
    let captured = record(
        "y1",
        SOURCE_YIYAN,
        vec![message("m1", Role::User, "看这个【图片】\r\n\r\n\r\n好吗")],
    );
    harness.service.capture(captured, None).await.unwrap();
    harness.service.wait_idle().await;

    let stored = harness.service.record("y1").await.unwrap().unwrap();
    assert_eq!(stored.record.messages[0].content, "看这个[图片]\n\n好吗");
    harness.close().await;
}

#[tokio::test]
async fn tongyi_features_become_metadata() {
    let harness = Harness::new(SyncSettings::default()).await;
    let mut captured = record(
        "t1",
        SOURCE_TONGYI,
        vec![message("m1", Role::User, "search the web please")],
    );
    let mut meta = convey_core::Metadata::new();
    meta.insert("features".into(), serde_json::json!(["web-search"]));
    captured.metadata = Some(meta);

    harness.service.capture(captured, None).await.unwrap();
    harness.service.wait_idle().await;

    let stored = harness.service.record("t1").await.unwrap().unwrap();
    let metadata = stored.record.metadata.unwrap();
    assert_eq!(metadata["hasWebSearch"], true);
    assert_eq!(metadata["hasPlugins"], false);
    assert_eq!(metadata["messageCount"], 1);
    harness.close().await;
}

// ---- Capture validation and settings ----

#[tokio::test]
async fn disabled_source_and_empty_record_are_rejected() {
    let harness = Harness::new(SyncSettings {
        enabled_platforms: vec!["Claude".into()],
        ..SyncSettings::default()
    })
    .await;

    let err = harness
        .service
        .capture(sample_record("c1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConveyError::SourceDisabled(_)));

    let empty = record("c2", "Claude", vec![]);
    let err = harness.service.capture(empty, None).await.unwrap_err();
    assert!(matches!(err, ConveyError::InvalidRecord(_)));

    assert_eq!(harness.service.storage_info().await.unwrap().record_count, 0);
    harness.close().await;
}

#[tokio::test]
async fn updated_settings_survive_restart() {
    let harness = Harness::new(SyncSettings::default()).await;
    harness
        .service
        .update_settings(SyncSettings {
            auto_sync: true,
            sync_interval: 120,
            auth_token: "tok".into(),
            ..SyncSettings::default()
        })
        .await
        .unwrap();
    let (dir, db_path) = harness.close().await;

    let reopened = SqliteStore::open(db_path).await.unwrap();
    let settings = reopened.get_config().await.unwrap().unwrap();
    assert!(settings.auto_sync);
    assert_eq!(settings.sync_interval, 120);
    assert_eq!(settings.auth_token, "tok");
    reopened.close().await.unwrap();
    drop(dir);
}

#[tokio::test]
async fn sync_all_redelivers_stored_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let harness = Harness::new(pointing_at(&server)).await;
    for id in ["a", "b", "c"] {
        harness.service.capture(sample_record(id), None).await.unwrap();
    }
    harness.service.wait_idle().await;
    assert_eq!(harness.service.sync_all().await.unwrap(), 3);
    harness.service.wait_idle().await;

    assert_eq!(server.received_requests().await.unwrap().len(), 6);
    let statuses = harness.service.statuses().await.unwrap();
    assert_eq!(
        statuses.iter().map(|s| s.record_id.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
    harness.close().await;
}
