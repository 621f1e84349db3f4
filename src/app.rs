//! Application wiring.
//!
//! Builds the adapters selected by configuration, the message handler, and
//! the HTTP router with its tower middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::adapters::ai::{NoopEntityExtractor, ScriptedReplyGenerator};
use crate::adapters::http::{webhook_router, WebhookAppState};
use crate::adapters::storage::{FileConversationStore, InMemoryConversationStore};
use crate::application::ProcessMessageHandler;
use crate::config::{AppConfig, StorageBackend, ValidationError};
use crate::ports::{ConversationStore, EntityExtractor, ReplyGenerator};

/// Collaborators the handler is built from.
pub struct Collaborators {
    pub extractor: Arc<dyn EntityExtractor>,
    pub store: Arc<dyn ConversationStore>,
    pub replies: Arc<dyn ReplyGenerator>,
}

impl Collaborators {
    /// Default collaborators for a configuration.
    ///
    /// No model client is bundled: extraction is a no-op and replies follow
    /// the scripted prompts. The store follows `storage.backend`.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn ConversationStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryConversationStore::new()),
            StorageBackend::File => Arc::new(FileConversationStore::new(&config.storage.data_dir)),
        };

        Self {
            extractor: Arc::new(NoopEntityExtractor),
            store,
            replies: Arc::new(ScriptedReplyGenerator::new()),
        }
    }
}

/// Builds the message handler from configuration and collaborators.
pub fn build_handler(
    config: &AppConfig,
    collaborators: Collaborators,
) -> Result<ProcessMessageHandler, ValidationError> {
    let business_hours = config.business_hours.to_business_hours()?;

    Ok(ProcessMessageHandler::new(
        collaborators.extractor,
        collaborators.store,
        collaborators.replies,
        business_hours,
    )
    .with_options(config.conversation.handler_options()))
}

/// Builds the HTTP router with tracing and request timeouts.
pub fn build_router(
    config: &AppConfig,
    collaborators: Collaborators,
) -> Result<Router, ValidationError> {
    let handler = build_handler(config, collaborators)?;

    info!(
        storage = ?config.storage.backend,
        handoff_on_extractor_failure = config.conversation.handoff_on_extractor_failure,
        "Conversation handler ready"
    );

    Ok(webhook_router(WebhookAppState::new(Arc::new(handler)))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http()))
}
