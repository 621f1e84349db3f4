//! Conversation command handlers.

mod process_message;

pub use process_message::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler, ProcessMessageOptions,
    ProcessMessageResult, TurnStatus,
};
