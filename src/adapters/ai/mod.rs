//! AI Adapters
//!
//! Implementations of the `EntityExtractor` and `ReplyGenerator` ports that
//! work without a live model: queued mocks for tests, a no-op extractor, and
//! the scripted reply generator used as the fallback voice of the assistant.

mod mock_entity_extractor;
mod scripted_reply_generator;

pub use mock_entity_extractor::{MockEntityExtractor, NoopEntityExtractor};
pub use scripted_reply_generator::{MockReplyGenerator, ScriptedReplyGenerator};
