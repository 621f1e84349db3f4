//! Conversation flow configuration

use serde::Deserialize;

use crate::application::ProcessMessageOptions;

/// Tunables for the automated conversation
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConversationConfig {
    /// Hand the conversation to a human when entity extraction fails
    #[serde(default)]
    pub handoff_on_extractor_failure: bool,
}

impl ConversationConfig {
    pub fn handler_options(&self) -> ProcessMessageOptions {
        ProcessMessageOptions {
            handoff_on_extractor_failure: self.handoff_on_extractor_failure,
        }
    }
}
