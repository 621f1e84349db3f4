//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `scheduling` - Conversation stages, customer record, triage and completeness rules

pub mod foundation;
pub mod scheduling;
