//! Scheduling conversation core.
//!
//! Stage progression, customer data collection, completeness, and exception
//! triage for the upholstery-cleaning sales script. Everything here is pure
//! computation over values handed in by the caller; persistence and model
//! calls live behind the ports.

mod business_hours;
mod completion;
mod controller;
mod customer;
mod extraction;
mod stage;
mod stage_machine;
mod triage;
mod validation;

pub use business_hours::{BusinessHours, DailyWindow};
pub use completion::{CompletionPolicy, MandatoryField};
pub use controller::{ConversationController, TurnAction, TurnOutcome};
pub use customer::{
    identity_keys, location_keys, service_keys, CustomerIdentity, CustomerRecord, FieldMap,
    ItemType, QuoteDecision, ServiceLocation, ServiceRequest,
};
pub use extraction::{ExtractionError, ExtractionResult, MAX_OUTPUT_LENGTH};
pub use stage::Stage;
pub use stage_machine::StageMachine;
pub use triage::{
    ExceptionFinding, ExceptionKind, ExceptionTriage, TriageContext, GENERIC_RESPONSE,
};
pub use validation::{is_valid_email, is_valid_national_id, is_valid_phone};
