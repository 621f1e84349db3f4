//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod conversation;

pub use conversation::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler, ProcessMessageOptions,
    ProcessMessageResult, TurnStatus,
};
