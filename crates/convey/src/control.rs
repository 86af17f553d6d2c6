// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited JSON control protocol spoken by `convey serve`.
//!
//! Each input line is one [`ControlRequest`], tagged by `type`. Every
//! request gets exactly one [`Outbound::Response`] line; delivery
//! notifications are interleaved as [`Outbound::Event`] lines.

use convey_core::{DeliveryStatus, OriginContext, Record, SyncEvent, SyncSettings};
use convey_sync::SyncService;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A request read from the control input.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlRequest {
    /// A freshly captured conversation to process and deliver.
    NewConversation {
        conversation: Record,
        #[serde(default)]
        origin: Option<OriginContext>,
    },
    /// Re-enqueue every stored conversation.
    SyncRequest,
    /// Return every stored delivery status.
    GetStatus,
    /// Replace the stored sync settings.
    ConfigUpdated { config: SyncSettings },
}

impl ControlRequest {
    fn kind(&self) -> &'static str {
        match self {
            Self::NewConversation { .. } => "NEW_CONVERSATION",
            Self::SyncRequest => "SYNC_REQUEST",
            Self::GetStatus => "GET_STATUS",
            Self::ConfigUpdated { .. } => "CONFIG_UPDATED",
        }
    }
}

/// Reply to a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    /// Request type this answers; absent when the line could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<&'static str>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueued: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<DeliveryStatus>>,
}

impl ControlResponse {
    fn ok(request: &'static str) -> Self {
        Self {
            request: Some(request),
            success: true,
            ..Self::default()
        }
    }

    fn failed(request: Option<&'static str>, error: impl ToString) -> Self {
        Self {
            request,
            success: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// One line written to the control output.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outbound {
    Response(ControlResponse),
    Event(SyncEvent),
}

/// Parse and execute one input line.
pub async fn handle_line(service: &SyncService, line: &str) -> ControlResponse {
    match serde_json::from_str::<ControlRequest>(line) {
        Ok(request) => handle(service, request).await,
        Err(e) => {
            warn!(error = %e, "unparseable control message");
            ControlResponse::failed(None, format!("invalid control message: {e}"))
        }
    }
}

/// Execute one parsed request against the service.
pub async fn handle(service: &SyncService, request: ControlRequest) -> ControlResponse {
    let kind = request.kind();
    debug!(request = kind, "control request received");

    match request {
        ControlRequest::NewConversation {
            conversation,
            origin,
        } => match service.capture(conversation, origin).await {
            Ok(task_id) => ControlResponse {
                task_id: Some(task_id),
                ..ControlResponse::ok(kind)
            },
            Err(e) => ControlResponse::failed(Some(kind), e),
        },
        ControlRequest::SyncRequest => match service.sync_all().await {
            Ok(count) => ControlResponse {
                enqueued: Some(count),
                ..ControlResponse::ok(kind)
            },
            Err(e) => ControlResponse::failed(Some(kind), e),
        },
        ControlRequest::GetStatus => match service.statuses().await {
            Ok(statuses) => ControlResponse {
                statuses: Some(statuses),
                ..ControlResponse::ok(kind)
            },
            Err(e) => ControlResponse::failed(Some(kind), e),
        },
        ControlRequest::ConfigUpdated { config } => match service.update_settings(config).await {
            Ok(()) => ControlResponse::ok(kind),
            Err(e) => ControlResponse::failed(Some(kind), e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use convey_core::SyncState;
    use convey_sync::RetryPolicy;
    use convey_test_utils::{MemoryStore, MockBackend, RecordingObserver};

    fn service() -> SyncService {
        SyncService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MockBackend::new()),
            Arc::new(RecordingObserver::new()),
            RetryPolicy::default(),
        )
    }

    const CONVERSATION: &str = r#"{
        "type": "NEW_CONVERSATION",
        "origin": 12,
        "conversation": {
            "id": "conv-1",
            "platform": "Claude",
            "title": "Artifacts",
            "url": "https://claude.example.com/chat/1",
            "createdAt": "2026-03-01T08:00:00.000Z",
            "updatedAt": "2026-03-01T08:02:00.000Z",
            "messages": [{
                "id": "m1",
                "role": "user",
                "content": "make me an artifact",
                "contentType": "text",
                "timestamp": "2026-03-01T08:00:00.000Z"
            }]
        }
    }"#;

    #[test]
    fn parses_every_request_type() {
        let req: ControlRequest = serde_json::from_str(CONVERSATION).unwrap();
        assert!(matches!(
            req,
            ControlRequest::NewConversation { origin: Some(OriginContext(12)), .. }
        ));
        assert!(matches!(
            serde_json::from_str::<ControlRequest>(r#"{"type":"SYNC_REQUEST"}"#).unwrap(),
            ControlRequest::SyncRequest
        ));
        assert!(matches!(
            serde_json::from_str::<ControlRequest>(r#"{"type":"GET_STATUS"}"#).unwrap(),
            ControlRequest::GetStatus
        ));

        let update = r#"{"type":"CONFIG_UPDATED","config":{
            "autoSync":true,"syncInterval":60,"dataRetentionDays":7,
            "apiEndpoint":"","authToken":"","enabledPlatforms":["Claude"]}}"#;
        match serde_json::from_str::<ControlRequest>(update).unwrap() {
            ControlRequest::ConfigUpdated { config } => {
                assert!(config.auto_sync);
                assert_eq!(config.enabled_platforms, vec!["Claude"]);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn outbound_lines_are_tagged() {
        let event = Outbound::Event(SyncEvent::success("c1", None));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "EVENT");
        assert_eq!(json["kind"], "SYNC_SUCCESS");
        assert_eq!(json["recordId"], "c1");

        let response = Outbound::Response(ControlResponse::ok("SYNC_REQUEST"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "RESPONSE");
        assert_eq!(json["request"], "SYNC_REQUEST");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn new_conversation_then_status() {
        let svc = service();
        let response = handle_line(&svc, CONVERSATION).await;
        assert!(response.success, "{response:?}");
        assert!(response.task_id.is_some());

        svc.wait_idle().await;
        let status = handle_line(&svc, r#"{"type":"GET_STATUS"}"#).await;
        let statuses = status.statuses.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].record_id, "conv-1");
        assert_eq!(statuses[0].state, SyncState::Success);
    }

    #[tokio::test]
    async fn rejected_capture_reports_the_reason() {
        let svc = service();
        svc.update_settings(SyncSettings {
            enabled_platforms: vec!["ChatGPT".into()],
            ..SyncSettings::default()
        })
        .await
        .unwrap();

        let response = handle_line(&svc, CONVERSATION).await;
        assert!(!response.success);
        assert_eq!(response.request, Some("NEW_CONVERSATION"));
        assert_eq!(response.error.as_deref(), Some("source `Claude` is not enabled"));
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn garbage_line_is_answered_not_fatal() {
        let svc = service();
        let response = handle_line(&svc, "{not json").await;
        assert!(!response.success);
        assert!(response.request.is_none());
        assert!(response.error.unwrap().starts_with("invalid control message"));

        let unknown = handle_line(&svc, r#"{"type":"REBOOT"}"#).await;
        assert!(!unknown.success);
    }

    #[tokio::test]
    async fn sync_request_counts_stored_records() {
        let svc = service();
        handle_line(&svc, CONVERSATION).await;
        svc.wait_idle().await;

        let response = handle_line(&svc, r#"{"type":"SYNC_REQUEST"}"#).await;
        assert_eq!(response.enqueued, Some(1));
        svc.wait_idle().await;
        assert_eq!(
            svc.status("conv-1").await.unwrap().unwrap().state,
            SyncState::Success
        );
    }

    #[tokio::test]
    async fn config_update_with_zero_retention_is_refused() {
        let svc = service();
        let update = r#"{"type":"CONFIG_UPDATED","config":{
            "autoSync":false,"syncInterval":300,"dataRetentionDays":0,
            "apiEndpoint":"","authToken":"","enabledPlatforms":["Claude"]}}"#;

        let response = handle_line(&svc, update).await;
        assert!(!response.success);
        assert_eq!(response.request, Some("CONFIG_UPDATED"));
        assert!(response.error.unwrap().contains("dataRetentionDays"));
        assert_eq!(svc.settings().await.unwrap().data_retention_days, 30);
        svc.shutdown().await;
    }
}
