//! HTTP handlers for the messaging webhook.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::application::{ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler};
use crate::domain::foundation::{ConversationId, DomainError};

use super::dto::{ErrorResponse, InboundMessage, WebhookResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhookAppState {
    pub process_message: Arc<ProcessMessageHandler>,
}

impl WebhookAppState {
    pub fn new(process_message: Arc<ProcessMessageHandler>) -> Self {
        Self { process_message }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /webhook/messages - Process one inbound customer message
pub async fn receive_message(
    State(state): State<WebhookAppState>,
    Json(msg): Json<InboundMessage>,
) -> Response {
    if msg.from_me || msg.is_group {
        debug!(message_id = %msg.message_id, "Ignoring own or group message");
        return (
            StatusCode::OK,
            Json(WebhookResponse::ignored("own or group message")),
        )
            .into_response();
    }

    let Some(text) = msg.text() else {
        debug!(message_id = %msg.message_id, "Ignoring message without text");
        return (
            StatusCode::OK,
            Json(WebhookResponse::ignored("message without text")),
        )
            .into_response();
    };

    let conversation_id = match ConversationId::new(msg.phone.as_str()) {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::from(DomainError::from(e))),
            )
                .into_response()
        }
    };

    let cmd = ProcessMessageCommand::new(conversation_id, text);

    match state.process_message.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(WebhookResponse::from(result))).into_response(),
        Err(e) => handle_process_error(e),
    }
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

fn handle_process_error(err: ProcessMessageError) -> Response {
    match err {
        ProcessMessageError::EmptyContent => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from(DomainError::from(err))),
        )
            .into_response(),
        ProcessMessageError::Store(ref e) => {
            error!(error = %e, "Failed to persist conversation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Failed to persist conversation")),
            )
                .into_response()
        }
    }
}
