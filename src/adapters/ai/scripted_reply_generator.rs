//! Reply generators that do not call a model.
//!
//! `ScriptedReplyGenerator` answers with the canned script line for the
//! stage; `MockReplyGenerator` replays queued replies for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::scheduling::Stage;
use crate::ports::{ReplyError, ReplyGenerator, ReplyRequest};

/// Writes the scripted prompt for the request's stage.
///
/// While collecting registration data, the missing fields are listed so the
/// customer is only asked for what is still needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedReplyGenerator;

impl ScriptedReplyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Builds the reply text without going through the async port.
    pub fn compose(&self, stage: Stage, missing_fields: &[&'static str]) -> String {
        let prompt = stage.scripted_prompt();
        let collecting = matches!(stage, Stage::CustomerIdentified | Stage::QuoteConfirmed);

        if collecting && !missing_fields.is_empty() {
            format!("Ainda preciso de: {}.", missing_fields.join(", "))
        } else {
            prompt.to_string()
        }
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedReplyGenerator {
    async fn generate(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        Ok(self.compose(request.stage, &request.missing_fields))
    }
}

/// Mock reply generator with a queue of canned replies.
///
/// Once the queue is empty every call returns "Mock reply".
#[derive(Debug, Clone, Default)]
pub struct MockReplyGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, ReplyError>>>>,
    calls: Arc<Mutex<Vec<ReplyRequest>>>,
}

impl MockReplyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(reply.into()));
        self
    }

    pub fn with_error(self, error: ReplyError) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn get_calls(&self) -> Vec<ReplyRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReplyGenerator for MockReplyGenerator {
    async fn generate(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok("Mock reply".to_string()))
    }
}
