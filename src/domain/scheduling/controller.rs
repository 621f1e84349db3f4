//! Per-turn composition of the scheduling core.
//!
//! Call order is fixed: update the record, triage the utterance, then either
//! force handoff (some finding demands it), answer a non-forcing finding with
//! its template, or let the stage machine decide.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::foundation::{ConversationId, StateMachine};

use super::completion::CompletionPolicy;
use super::customer::CustomerRecord;
use super::extraction::ExtractionResult;
use super::stage::Stage;
use super::stage_machine::StageMachine;
use super::triage::{ExceptionFinding, ExceptionKind, ExceptionTriage, TriageContext};

/// What the caller should do to answer the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnAction {
    /// Reply with the canned text for this category.
    RespondWithTemplate { kind: ExceptionKind },
    /// Let the language model write the reply.
    InvokeLanguageModel,
}

/// Result of one processed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub stage: Stage,
    pub record: CustomerRecord,
    pub action: TurnAction,
    /// Findings raised by the utterance and the context flags.
    pub findings: Vec<ExceptionFinding>,
    /// The finding that selected the template, if any.
    pub principal: Option<ExceptionFinding>,
    /// Advisory invalid-data findings; they never change the stage.
    pub advisories: Vec<ExceptionFinding>,
    pub missing_fields: Vec<&'static str>,
}

impl TurnOutcome {
    pub fn is_handoff(&self) -> bool {
        self.stage.is_handoff()
    }
}

/// Composes record updates, triage, and stage progression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationController {
    policy: CompletionPolicy,
    triage: ExceptionTriage,
    machine: StageMachine,
}

impl ConversationController {
    pub fn new() -> Self {
        let policy = CompletionPolicy::new();
        Self {
            policy,
            triage: ExceptionTriage::new(),
            machine: StageMachine::new(policy),
        }
    }

    pub fn triage(&self) -> &ExceptionTriage {
        &self.triage
    }

    pub fn policy(&self) -> &CompletionPolicy {
        &self.policy
    }

    /// Runs one turn over an owned record.
    ///
    /// Never fails: unknown hints degrade to no progression and a default
    /// extraction yields a well-defined outcome.
    pub fn process_turn(
        &self,
        conversation_id: &ConversationId,
        mut record: CustomerRecord,
        current_stage: Stage,
        raw_text: &str,
        extraction: &ExtractionResult,
        context: &TriageContext,
    ) -> TurnOutcome {
        let written = record.update_identity(&extraction.identity_fields())
            + record.update_service(&extraction.service_fields())
            + record.update_location(&extraction.location_fields());

        let findings = self.triage.detect(raw_text, context);
        let advisories = self.triage.validate(&record.identity);

        let forcing: Vec<ExceptionFinding> = findings
            .iter()
            .filter(|f| f.forces_handoff)
            .cloned()
            .collect();

        let (stage, principal) = if let Some(principal) = self.triage.select_principal(&forcing) {
            (Stage::Handoff, Some(principal.clone()))
        } else if let Some(principal) = self.triage.select_principal(&findings) {
            (current_stage, Some(principal.clone()))
        } else {
            (
                self.machine.next_stage(current_stage, extraction, &record),
                None,
            )
        };
        let stage = checked_transition(conversation_id, current_stage, stage);

        let action = match &principal {
            Some(finding) => TurnAction::RespondWithTemplate { kind: finding.kind },
            None => TurnAction::InvokeLanguageModel,
        };

        debug!(
            conversation_id = %conversation_id.masked(),
            from = %current_stage,
            to = %stage,
            fields_written = written,
            findings = findings.len(),
            advisories = advisories.len(),
            ?action,
            "Turn decided"
        );

        let missing_fields = self.policy.missing_fields(&record);

        TurnOutcome {
            stage,
            record,
            action,
            findings,
            principal,
            advisories,
            missing_fields,
        }
    }

    /// Ordered labels of the mandatory fields still missing.
    pub fn missing_fields(&self, record: &CustomerRecord) -> Vec<&'static str> {
        self.policy.missing_fields(record)
    }
}

/// Applies a proposed stage change through the stage state machine.
///
/// A change the machine does not allow leaves the stage where it was.
fn checked_transition(conversation_id: &ConversationId, current: Stage, proposed: Stage) -> Stage {
    if proposed == current {
        return current;
    }
    match current.transition_to(proposed) {
        Ok(next) => next,
        Err(e) => {
            warn!(
                conversation_id = %conversation_id.masked(),
                from = %current,
                to = %proposed,
                error = %e,
                "Rejected stage change, keeping current stage"
            );
            current
        }
    }
}
