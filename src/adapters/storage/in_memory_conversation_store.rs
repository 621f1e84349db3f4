//! In-Memory Conversation Store Adapter
//!
//! Keeps snapshots in a process-local map. Useful for tests and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationSnapshot, ConversationStore, StoreError};

/// In-memory storage for conversation snapshots
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    snapshots: Arc<RwLock<HashMap<ConversationId, ConversationSnapshot>>>,
}

impl InMemoryConversationStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }

    /// Get the number of stored snapshots
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, id: &ConversationId) -> Result<Option<ConversationSnapshot>, StoreError> {
        Ok(self.snapshots.read().await.get(id).cloned())
    }

    async fn save(&self, snapshot: &ConversationSnapshot) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.conversation_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, StoreError> {
        Ok(self.snapshots.read().await.contains_key(id))
    }
}
