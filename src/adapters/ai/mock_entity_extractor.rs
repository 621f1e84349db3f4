//! Mock Entity Extractor for testing.
//!
//! Returns pre-configured extraction results in order and records every
//! request, so tests can drive multi-turn conversations without a model.
//!
//! # Example
//!
//! ```ignore
//! let extractor = MockEntityExtractor::new()
//!     .with_model_output(r#"{"item": "sofá"}"#)
//!     .with_error(ExtractionError::Unavailable("timeout".into()));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::scheduling::{ExtractionError, ExtractionResult};
use crate::ports::{EntityExtractor, ExtractionRequest};

/// Mock extractor with a queue of canned results.
///
/// Once the queue is empty every call returns the default (all unset) result.
#[derive(Debug, Clone, Default)]
pub struct MockEntityExtractor {
    responses: Arc<Mutex<VecDeque<Result<ExtractionResult, ExtractionError>>>>,
    calls: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl MockEntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful result.
    pub fn with_result(self, result: ExtractionResult) -> Self {
        self.push(Ok(result));
        self
    }

    /// Queues whatever parsing this raw model output produces.
    pub fn with_model_output(self, output: &str) -> Self {
        self.push(ExtractionResult::from_model_output(output));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: ExtractionError) -> Self {
        self.push(Err(error));
        self
    }

    /// Returns the number of calls made to this extractor.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns all recorded requests.
    pub fn get_calls(&self) -> Vec<ExtractionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, response: Result<ExtractionResult, ExtractionError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }
}

#[async_trait]
impl EntityExtractor for MockEntityExtractor {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(ExtractionResult::default()))
    }
}

/// Extractor that never extracts anything.
///
/// Used when no model is configured; every turn runs on the default result
/// so triage and context flags still work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEntityExtractor;

#[async_trait]
impl EntityExtractor for NoopEntityExtractor {
    async fn extract(
        &self,
        _request: ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        Ok(ExtractionResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use crate::domain::scheduling::Stage;

    fn request(message: &str) -> ExtractionRequest {
        ExtractionRequest::new(
            ConversationId::new("5585999990000").unwrap(),
            message,
            Stage::Initial,
        )
    }

    #[tokio::test]
    async fn returns_queued_results_in_order() {
        let extractor = MockEntityExtractor::new()
            .with_model_output(r#"{"item": "sofá"}"#)
            .with_error(ExtractionError::Unavailable("down".to_string()));

        let first = extractor.extract(request("um sofá")).await.unwrap();
        assert_eq!(first.item.as_deref(), Some("sofá"));

        let second = extractor.extract(request("...")).await;
        assert!(second.is_err());

        let third = extractor.extract(request("oi")).await.unwrap();
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn records_calls() {
        let extractor = MockEntityExtractor::new();
        extractor.extract(request("oi")).await.unwrap();
        extractor.extract(request("tudo bem?")).await.unwrap();

        assert_eq!(extractor.call_count(), 2);
        assert_eq!(extractor.get_calls()[1].message, "tudo bem?");
    }

    #[tokio::test]
    async fn noop_extractor_returns_default() {
        let result = NoopEntityExtractor.extract(request("sofá")).await.unwrap();
        assert_eq!(result, ExtractionResult::default());
    }
}
