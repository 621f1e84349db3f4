//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! It owns the caller-side guarantees of the scheduling core: one in-flight
//! turn per conversation, and no automated turns after handoff.

pub mod handlers;

pub use handlers::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler, ProcessMessageOptions,
    ProcessMessageResult, TurnStatus,
};
