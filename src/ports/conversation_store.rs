//! Conversation Store Port - Interface for persisting conversation state.
//!
//! One snapshot per conversation holds the current stage and the collected
//! customer record. Implementations must round-trip snapshots losslessly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::scheduling::{CustomerRecord, Stage};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to serialize snapshot: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize snapshot: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Persisted state of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation_id: ConversationId,
    pub stage: Stage,
    pub record: CustomerRecord,
    pub turn_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationSnapshot {
    /// Fresh conversation: empty record, initial stage.
    pub fn new(conversation_id: ConversationId) -> Self {
        let now = Timestamp::now();
        Self {
            conversation_id,
            stage: Stage::Initial,
            record: CustomerRecord::new(),
            turn_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores the outcome of a processed turn.
    pub fn record_turn(&mut self, stage: Stage, record: CustomerRecord) {
        self.stage = stage;
        self.record = record;
        self.turn_count += 1;
        self.updated_at = Timestamp::now();
    }
}

/// Port for loading and saving conversation snapshots.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load the snapshot for a conversation
    ///
    /// # Returns
    /// `None` if the conversation has never been saved
    async fn load(&self, id: &ConversationId) -> Result<Option<ConversationSnapshot>, StoreError>;

    /// Save (create or overwrite) a snapshot
    async fn save(&self, snapshot: &ConversationSnapshot) -> Result<(), StoreError>;

    /// Check if a snapshot exists for a conversation
    async fn exists(&self, id: &ConversationId) -> Result<bool, StoreError>;
}
