//! HTTP adapter for the messaging webhook.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, InboundMessage, TextContent, WebhookResponse};
pub use handlers::WebhookAppState;
pub use routes::webhook_router;
