// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end delivery through the real HTTP backend against a mock server.

use std::sync::Arc;
use std::time::Duration;

use convey_core::{LocalStore, SyncEventKind, SyncSettings, SyncState};
use convey_sync::{BroadcastObserver, HttpBackend, RetryPolicy, SyncService};
use convey_test_utils::MemoryStore;
use convey_test_utils::fixtures::sample_record;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(10))
}

async fn service_for(
    server: &MockServer,
    policy: RetryPolicy,
) -> (SyncService, Arc<MemoryStore>, BroadcastObserver) {
    let store = Arc::new(MemoryStore::new());
    let observer = BroadcastObserver::default();
    let backend = HttpBackend::new(Duration::from_secs(5)).unwrap();
    let service = SyncService::new(
        store.clone(),
        Arc::new(backend),
        Arc::new(observer.clone()),
        policy,
    );
    service
        .start(&SyncSettings {
            api_endpoint: format!("{}/", server.uri()),
            auth_token: "tok".into(),
            ..SyncSettings::default()
        })
        .await
        .unwrap();
    (service, store, observer)
}

#[tokio::test]
async fn transient_failures_recover_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("hiccup"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (service, store, observer) = service_for(&server, fast_policy(3)).await;
    let mut events = observer.subscribe();

    service.capture(sample_record("c1"), None).await.unwrap();
    service.wait_idle().await;

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(
        store.states_for("c1").await,
        vec![
            SyncState::Syncing,
            SyncState::Pending,
            SyncState::Syncing,
            SyncState::Pending,
            SyncState::Syncing,
            SyncState::Success,
        ]
    );
    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, SyncEventKind::SyncSuccess);
    assert_eq!(event.record_id, "c1");

    service.shutdown().await;
}

#[tokio::test]
async fn exhausted_retries_keep_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let (service, store, observer) = service_for(&server, fast_policy(2)).await;
    let mut events = observer.subscribe();

    service.capture(sample_record("c1"), None).await.unwrap();
    service.wait_idle().await;

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    let status = store.get_status("c1").await.unwrap().unwrap();
    assert_eq!(status.state, SyncState::Error);
    assert_eq!(status.error.as_deref(), Some("backend sync failed: 503 - down"));

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, SyncEventKind::SyncError);
    assert_eq!(event.error.as_deref(), Some("backend sync failed: 503 - down"));

    // The record stays persisted locally even though delivery failed.
    assert!(store.get("c1").await.unwrap().is_some());
    service.shutdown().await;
}

#[tokio::test]
async fn posted_body_is_the_processed_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (service, _store, _observer) = service_for(&server, fast_policy(0)).await;
    service.capture(sample_record("c1"), None).await.unwrap();
    service.wait_idle().await;

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["id"], "c1");
    assert_eq!(body["platform"], "ChatGPT");
    assert_eq!(body["processed"], true);
    assert_eq!(body["summary"], "how to reverse a list?");
    assert_eq!(body["metadata"]["messageCount"], 2);
    assert!(
        body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .starts_with("```plaintext")
    );
    service.shutdown().await;
}
