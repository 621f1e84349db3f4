//! Integration tests for the webhook HTTP surface.
//!
//! These tests exercise the router built by `app::build_router`, including
//! its middleware, with mock collaborators:
//! 1. Notifications that must not start a turn are acknowledged and ignored
//! 2. Customer messages are processed and answered with the turn outcome
//! 3. Validation and storage failures map to the expected status codes

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use scheduling_agent::adapters::ai::{MockEntityExtractor, MockReplyGenerator};
use scheduling_agent::adapters::storage::InMemoryConversationStore;
use scheduling_agent::app::{build_router, Collaborators};
use scheduling_agent::config::AppConfig;
use scheduling_agent::domain::foundation::ConversationId;
use scheduling_agent::domain::scheduling::Stage;
use scheduling_agent::ports::{ConversationSnapshot, ConversationStore, StoreError};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Configuration whose business hours never close, so turns run on the
/// wall clock without tripping the off-hours check.
fn always_open_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.business_hours.weekday_open_hour = 0;
    config.business_hours.weekday_close_hour = 24;
    config.business_hours.saturday_open_hour = 0;
    config.business_hours.saturday_close_hour = 24;
    config.business_hours.sunday_open_hour = Some(0);
    config.business_hours.sunday_close_hour = Some(24);
    config
}

fn router_with(extractor: MockEntityExtractor, store: Arc<dyn ConversationStore>) -> Router {
    let collaborators = Collaborators {
        extractor: Arc::new(extractor),
        store,
        replies: Arc::new(MockReplyGenerator::new().with_reply("Qual item deseja higienizar?")),
    };
    build_router(&always_open_config(), collaborators).unwrap()
}

fn router() -> Router {
    router_with(
        MockEntityExtractor::new(),
        Arc::new(InMemoryConversationStore::new()),
    )
}

async fn post_message(router: Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/messages")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn message(phone: &str, text: &str) -> Value {
    json!({
        "messageId": "3EB0C767D26A1D",
        "phone": phone,
        "text": { "message": text },
        "senderName": "Maria",
        "fromMe": false,
        "isGroup": false
    })
}

/// Store that fails every operation.
struct FailingStore;

#[async_trait]
impl ConversationStore for FailingStore {
    async fn load(&self, _id: &ConversationId) -> Result<Option<ConversationSnapshot>, StoreError> {
        Err(StoreError::IoError("disk unavailable".to_string()))
    }

    async fn save(&self, _snapshot: &ConversationSnapshot) -> Result<(), StoreError> {
        Err(StoreError::IoError("disk unavailable".to_string()))
    }

    async fn exists(&self, _id: &ConversationId) -> Result<bool, StoreError> {
        Err(StoreError::IoError("disk unavailable".to_string()))
    }
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

// =============================================================================
// Ignored notifications
// =============================================================================

#[tokio::test]
async fn own_messages_are_ignored() {
    let extractor = MockEntityExtractor::new();
    let router = router_with(extractor.clone(), Arc::new(InMemoryConversationStore::new()));

    let mut payload = message("5585999990000", "Olá");
    payload["fromMe"] = json!(true);
    let (status, body) = post_message(router, payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(extractor.call_count(), 0);
}

#[tokio::test]
async fn group_messages_are_ignored() {
    let mut payload = message("5585999990000", "Bom dia, grupo");
    payload["isGroup"] = json!(true);
    let (status, body) = post_message(router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
}

#[tokio::test]
async fn media_without_text_is_ignored() {
    let payload = json!({
        "messageId": "3EB0C767D26A1E",
        "phone": "5585999990000",
        "image": { "imageUrl": "https://example.com/sofa.jpg" }
    });
    let (status, body) = post_message(router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
}

// =============================================================================
// Processed messages
// =============================================================================

#[tokio::test]
async fn text_message_is_processed() {
    let extractor = MockEntityExtractor::new().with_model_output(r#"{"item": "sofá"}"#);
    let store = InMemoryConversationStore::new();
    let router = router_with(extractor, Arc::new(store.clone()));

    let (status, body) =
        post_message(router, message("5585999990000", "Quero limpar meu sofá")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processed");
    assert_eq!(body["stage"], "item_identified");
    assert_eq!(body["message"], "Qual item deseja higienizar?");
    assert_eq!(body["missing_fields"].as_array().unwrap().len(), 7);

    let id = ConversationId::new("5585999990000").unwrap();
    let saved = store.load(&id).await.unwrap().unwrap();
    assert_eq!(saved.stage, Stage::ItemIdentified);
}

#[tokio::test]
async fn cancellation_hands_off_then_waits_for_human() {
    let store = InMemoryConversationStore::new();

    let router = router_with(MockEntityExtractor::new(), Arc::new(store.clone()));
    let (status, body) = post_message(
        router,
        message("5585999990000", "Quero cancelar o agendamento"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "handed_off");
    assert_eq!(body["stage"], "handoff");

    let router = router_with(MockEntityExtractor::new(), Arc::new(store.clone()));
    let (status, body) = post_message(router, message("5585999990000", "Oi?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "awaiting_human");
    assert!(body.get("message").is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn blank_phone_is_rejected() {
    let (status, body) = post_message(router(), message("   ", "Olá")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/messages")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": {"message": "Olá"}}"#))
        .unwrap();

    let response = router().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn storage_failure_returns_internal_error() {
    let router = router_with(MockEntityExtractor::new(), Arc::new(FailingStore));

    let (status, body) = post_message(router, message("5585999990000", "Olá")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
}
