//! File-based Conversation Store Adapter
//!
//! Stores one YAML file per conversation under a base directory, which keeps
//! the collected data easy to inspect while debugging a dialogue.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationSnapshot, ConversationStore, StoreError};

/// File-based storage for conversation snapshots
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    base_path: PathBuf,
}

impl FileConversationStore {
    /// Create a new file store rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let store = FileConversationStore::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot file for a conversation.
    ///
    /// Bytes outside `[A-Za-z0-9@_-]` are written as `%XX`, so distinct ids
    /// always get distinct files and no id can escape the base directory.
    fn snapshot_path(&self, id: &ConversationId) -> PathBuf {
        let mut file_stem = String::with_capacity(id.as_str().len());
        for byte in id.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'@' | b'_' | b'-') {
                file_stem.push(char::from(byte));
            } else {
                file_stem.push_str(&format!("%{byte:02X}"));
            }
        }
        self.base_path.join(format!("{file_stem}.yaml"))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn load(&self, id: &ConversationId) -> Result<Option<ConversationSnapshot>, StoreError> {
        let file_path = self.snapshot_path(id);

        if !fs::try_exists(&file_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?
        {
            return Ok(None);
        }

        let yaml = fs::read_to_string(&file_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        let snapshot = serde_yaml::from_str(&yaml)
            .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &ConversationSnapshot) -> Result<(), StoreError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(snapshot)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        // Write to a sibling file first so readers never see a partial snapshot
        let file_path = self.snapshot_path(&snapshot.conversation_id);
        let tmp_path = file_path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        Ok(())
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, StoreError> {
        fs::try_exists(self.snapshot_path(id))
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))
    }
}
