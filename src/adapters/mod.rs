//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Extractor and reply generator implementations
//! - `http` - Webhook endpoint (axum)
//! - `storage` - Conversation stores (in-memory, YAML files)

pub mod ai;
pub mod http;
pub mod storage;
