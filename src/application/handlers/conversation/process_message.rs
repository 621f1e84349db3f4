//! ProcessMessage command handler.
//!
//! Runs one customer message through the scheduling core: load the
//! conversation, extract entities, decide the turn, persist, and write the
//! reply. Turns for the same conversation are serialized here; turns for
//! different conversations run in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, StateMachine, Timestamp};
use crate::domain::scheduling::{
    BusinessHours, ConversationController, ExceptionKind, ExtractionResult, Stage, TriageContext,
    TurnAction, TurnOutcome,
};
use crate::ports::{
    ConversationSnapshot, ConversationStore, EntityExtractor, ExtractionRequest, ReplyGenerator,
    ReplyRequest, StoreError,
};

/// Command carrying one inbound customer message.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub conversation_id: ConversationId,
    /// The message text, verbatim.
    pub text: String,
    /// When the message was received; drives the business-hours check.
    pub received_at: Timestamp,
}

impl ProcessMessageCommand {
    pub fn new(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            text: text.into(),
            received_at: Timestamp::now(),
        }
    }

    pub fn received_at(mut self, at: Timestamp) -> Self {
        self.received_at = at;
        self
    }
}

/// How the turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The automated flow answered and continues.
    Processed,
    /// This turn moved the conversation to a human operator.
    HandedOff,
    /// The conversation already belongs to a human; nothing was run.
    AwaitingHuman,
}

/// Result of processing a message.
#[derive(Debug, Clone)]
pub struct ProcessMessageResult {
    pub conversation_id: ConversationId,
    pub status: TurnStatus,
    pub stage: Stage,
    /// Text to send back; `None` while a human owns the conversation.
    pub reply: Option<String>,
    pub missing_fields: Vec<&'static str>,
    /// Categories raised by triage this turn.
    pub findings: Vec<ExceptionKind>,
}

/// Errors that can occur when processing a message.
#[derive(Debug, Error)]
pub enum ProcessMessageError {
    /// Message text is empty or whitespace only.
    #[error("Validation error: message text cannot be empty")]
    EmptyContent,

    /// Loading or saving the conversation failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<ProcessMessageError> for DomainError {
    fn from(err: ProcessMessageError) -> Self {
        match err {
            ProcessMessageError::EmptyContent => {
                DomainError::new(ErrorCode::EmptyContent, err.to_string())
            }
            ProcessMessageError::Store(_) => {
                DomainError::new(ErrorCode::StorageError, err.to_string())
            }
        }
    }
}

/// Tunables for the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMessageOptions {
    /// Hand the conversation to a human when the extractor fails.
    pub handoff_on_extractor_failure: bool,
}

/// Handler for ProcessMessage commands.
pub struct ProcessMessageHandler {
    extractor: Arc<dyn EntityExtractor>,
    store: Arc<dyn ConversationStore>,
    replies: Arc<dyn ReplyGenerator>,
    controller: ConversationController,
    business_hours: BusinessHours,
    options: ProcessMessageOptions,
    locks: TurnLocks,
}

impl ProcessMessageHandler {
    pub fn new(
        extractor: Arc<dyn EntityExtractor>,
        store: Arc<dyn ConversationStore>,
        replies: Arc<dyn ReplyGenerator>,
        business_hours: BusinessHours,
    ) -> Self {
        Self {
            extractor,
            store,
            replies,
            controller: ConversationController::new(),
            business_hours,
            options: ProcessMessageOptions::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_options(mut self, options: ProcessMessageOptions) -> Self {
        self.options = options;
        self
    }

    /// Handles a process message command.
    pub async fn handle(
        &self,
        cmd: ProcessMessageCommand,
    ) -> Result<ProcessMessageResult, ProcessMessageError> {
        if cmd.text.trim().is_empty() {
            return Err(ProcessMessageError::EmptyContent);
        }

        let slot = self.slot_for(&cmd.conversation_id);
        let _turn = slot.acquire().await;
        self.run_turn(cmd).await
    }

    async fn run_turn(
        &self,
        cmd: ProcessMessageCommand,
    ) -> Result<ProcessMessageResult, ProcessMessageError> {
        let id = cmd.conversation_id;
        let text = cmd.text.trim();

        let mut snapshot = match self.store.load(&id).await? {
            Some(snapshot) => snapshot,
            None => ConversationSnapshot::new(id.clone()),
        };

        if snapshot.stage.is_terminal() {
            info!(
                conversation_id = %id.masked(),
                "Conversation is with a human operator, skipping automated turn"
            );
            return Ok(ProcessMessageResult {
                missing_fields: self.controller.missing_fields(&snapshot.record),
                conversation_id: id,
                status: TurnStatus::AwaitingHuman,
                stage: Stage::Handoff,
                reply: None,
                findings: Vec::new(),
            });
        }

        let request = ExtractionRequest::new(id.clone(), text, snapshot.stage)
            .with_missing_fields(self.controller.missing_fields(&snapshot.record));

        let (extraction, extractor_failed) = match self.extractor.extract(request).await {
            Ok(extraction) => (extraction, false),
            Err(e) => {
                warn!(
                    conversation_id = %id.masked(),
                    error = %e,
                    "Entity extraction failed, continuing with empty extraction"
                );
                (ExtractionResult::default(), true)
            }
        };

        if !extractor_failed && extraction.is_empty() {
            debug!(
                conversation_id = %id.masked(),
                stage = %snapshot.stage,
                "Extractor found nothing in the message"
            );
        }

        let context = TriageContext {
            outside_business_hours: !self.business_hours.is_open_at(cmd.received_at),
            technical_error: extractor_failed && self.options.handoff_on_extractor_failure,
        };

        let previous_stage = snapshot.stage;
        let outcome = self.controller.process_turn(
            &id,
            snapshot.record.clone(),
            previous_stage,
            text,
            &extraction,
            &context,
        );

        snapshot.record_turn(outcome.stage, outcome.record.clone());
        self.store.save(&snapshot).await?;

        let reply = self.reply_for(&id, text, &outcome).await;

        let status = if outcome.is_handoff() {
            info!(
                conversation_id = %id.masked(),
                from = %previous_stage,
                reason = ?outcome.principal.as_ref().map(|f| f.kind),
                "Conversation handed off"
            );
            TurnStatus::HandedOff
        } else {
            TurnStatus::Processed
        };

        info!(
            conversation_id = %id.masked(),
            stage = %outcome.stage,
            turn = snapshot.turn_count,
            missing = outcome.missing_fields.len(),
            "Turn processed"
        );

        Ok(ProcessMessageResult {
            conversation_id: id,
            status,
            stage: outcome.stage,
            reply: Some(reply),
            findings: outcome.findings.iter().map(|f| f.kind).collect(),
            missing_fields: outcome.missing_fields,
        })
    }

    /// Template text, field re-prompt, or a generated reply.
    async fn reply_for(&self, id: &ConversationId, text: &str, outcome: &TurnOutcome) -> String {
        let triage = self.controller.triage();

        if let TurnAction::RespondWithTemplate { kind } = outcome.action {
            return triage.response_template(kind).to_string();
        }

        if !outcome.is_handoff() {
            if let Some(field) = outcome.advisories.iter().find_map(|f| f.field) {
                return triage.reprompt_for(field).to_string();
            }
        }

        let request = ReplyRequest::new(id.clone(), outcome.stage, text)
            .with_missing_fields(outcome.missing_fields.clone());

        match self.replies.generate(request).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => outcome.stage.scripted_prompt().to_string(),
            Err(e) => {
                warn!(
                    conversation_id = %id.masked(),
                    error = %e,
                    "Reply generation failed, using scripted prompt"
                );
                outcome.stage.scripted_prompt().to_string()
            }
        }
    }

    fn slot_for(&self, id: &ConversationId) -> TurnSlot<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(id.clone()).or_default().clone();
        TurnSlot {
            locks: &self.locks,
            id: id.clone(),
            lock: Some(lock),
        }
    }
}

type TurnLocks = Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>;

/// A claim on one conversation's turn lock.
///
/// Dropping it, including when the turn future is cancelled, removes the map
/// entry once nobody else holds or waits on the lock.
struct TurnSlot<'a> {
    locks: &'a TurnLocks,
    id: ConversationId,
    lock: Option<Arc<AsyncMutex<()>>>,
}

impl TurnSlot<'_> {
    /// Waits for this conversation's turn.
    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&self.id);
        }
        // Released under the map lock so concurrent drops see exact counts
        drop(lock);
    }
}
