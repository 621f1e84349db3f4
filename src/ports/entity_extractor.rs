//! Entity Extractor Port - Interface for structured data extraction.
//!
//! The extractor turns a customer's free-text message into the fixed-shape
//! [`ExtractionResult`]. Implementations typically call a language model and
//! parse its output with [`ExtractionResult::from_model_output`].

use async_trait::async_trait;

use crate::domain::foundation::ConversationId;
use crate::domain::scheduling::{ExtractionError, ExtractionResult, Stage};

/// Input for one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub conversation_id: ConversationId,
    /// The customer's message, verbatim.
    pub message: String,
    /// Stage before this turn, as context for the model.
    pub stage: Stage,
    /// Labels of the mandatory fields still missing.
    pub missing_fields: Vec<&'static str>,
}

impl ExtractionRequest {
    pub fn new(conversation_id: ConversationId, message: impl Into<String>, stage: Stage) -> Self {
        Self {
            conversation_id,
            message: message.into(),
            stage,
            missing_fields: Vec::new(),
        }
    }

    pub fn with_missing_fields(mut self, missing: Vec<&'static str>) -> Self {
        self.missing_fields = missing;
        self
    }
}

/// Port for entity extraction.
///
/// Absent fields must come back unset, never as empty strings.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extracts structured fields from one message.
    ///
    /// # Errors
    /// Returns `ExtractionError` when the collaborator fails or its output
    /// cannot be parsed. Callers degrade to `ExtractionResult::default()`.
    async fn extract(&self, request: ExtractionRequest)
        -> Result<ExtractionResult, ExtractionError>;
}
