//! Axum routes for the webhook endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, receive_message, WebhookAppState};

/// Creates the application router.
///
/// Endpoints:
/// - POST /webhook/messages - Inbound customer message
/// - GET /health - Liveness probe
pub fn webhook_router(state: WebhookAppState) -> Router {
    Router::new()
        .route("/webhook/messages", post(receive_message))
        .route("/health", get(health))
        .with_state(state)
}
