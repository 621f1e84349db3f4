//! Reply Generator Port - Interface for writing assistant messages.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ConversationId;
use crate::domain::scheduling::Stage;

/// Errors from the reply collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("Reply provider unavailable: {0}")]
    Unavailable(String),

    #[error("Reply provider returned an empty message")]
    EmptyReply,
}

/// Everything the generator needs to write the next message.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub conversation_id: ConversationId,
    /// Stage after this turn.
    pub stage: Stage,
    /// The customer's message, verbatim.
    pub message: String,
    /// Guidance for the current stage.
    pub directive: &'static str,
    pub missing_fields: Vec<&'static str>,
}

impl ReplyRequest {
    pub fn new(conversation_id: ConversationId, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            conversation_id,
            stage,
            message: message.into(),
            directive: stage.directive(),
            missing_fields: Vec::new(),
        }
    }

    pub fn with_missing_fields(mut self, missing: Vec<&'static str>) -> Self {
        self.missing_fields = missing;
        self
    }
}

/// Port for generating the assistant's next message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: ReplyRequest) -> Result<String, ReplyError>;
}
