//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `EntityExtractor` - Turns a free-text message into an extraction result
//! - `ReplyGenerator` - Writes the next assistant message for a stage
//! - `ConversationStore` - Loads and saves the per-conversation snapshot

mod conversation_store;
mod entity_extractor;
mod reply_generator;

pub use conversation_store::{ConversationSnapshot, ConversationStore, StoreError};
pub use entity_extractor::{EntityExtractor, ExtractionRequest};
pub use reply_generator::{ReplyError, ReplyGenerator, ReplyRequest};
