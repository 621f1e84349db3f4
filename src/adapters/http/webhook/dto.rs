//! HTTP DTOs for the messaging webhook.
//!
//! Field names follow the messaging provider's camelCase payload.

use serde::{Deserialize, Serialize};

use crate::application::{ProcessMessageResult, TurnStatus};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::scheduling::Stage;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Inbound message notification from the messaging provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub message_id: String,
    /// Sender's phone number; keys the conversation.
    pub phone: String,
    /// Absent for media-only messages.
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub chat_name: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    /// True for messages we sent ourselves.
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
}

impl InboundMessage {
    /// Message text, if any non-blank text was sent.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_ref()
            .map(|t| t.message.trim())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned for every accepted notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// `processed`, `handed_off`, `awaiting_human` or `ignored`.
    pub status: String,
    /// Reply to deliver to the customer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
}

impl WebhookResponse {
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            status: "ignored".to_string(),
            message: Some(reason.into()),
            stage: None,
            missing_fields: Vec::new(),
        }
    }
}

impl From<ProcessMessageResult> for WebhookResponse {
    fn from(result: ProcessMessageResult) -> Self {
        let status = match result.status {
            TurnStatus::Processed => "processed",
            TurnStatus::HandedOff => "handed_off",
            TurnStatus::AwaitingHuman => "awaiting_human",
        };
        Self {
            status: status.to_string(),
            message: result.reply,
            stage: Some(result.stage),
            missing_fields: result
                .missing_fields
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError.to_string(),
            message: message.into(),
        }
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(err: DomainError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message,
        }
    }
}
