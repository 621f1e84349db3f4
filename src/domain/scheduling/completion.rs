//! Mandatory-data completeness policy.
//!
//! Decides which mandatory data points are still missing and whether the
//! conversation is allowed to leave the automated flow.

use serde::{Deserialize, Serialize};

use super::customer::CustomerRecord;
use super::stage::Stage;
use super::validation::{is_valid_email, is_valid_national_id, is_valid_phone};

/// One entry of the fixed mandatory field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandatoryField {
    FullName,
    Phone,
    NationalId,
    Email,
    Address,
    City,
    Item,
    QuoteAccepted,
}

impl MandatoryField {
    /// The mandatory set, in the order missing fields are reported.
    pub const ALL: [MandatoryField; 8] = [
        MandatoryField::FullName,
        MandatoryField::Phone,
        MandatoryField::NationalId,
        MandatoryField::Email,
        MandatoryField::Address,
        MandatoryField::City,
        MandatoryField::Item,
        MandatoryField::QuoteAccepted,
    ];

    /// Human-readable label, as shown to the customer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Nome completo",
            Self::Phone => "Telefone",
            Self::NationalId => "CPF",
            Self::Email => "E-mail",
            Self::Address => "Endereço completo",
            Self::City => "Cidade",
            Self::Item => "Item para higienização",
            Self::QuoteAccepted => "Aceite do orçamento",
        }
    }

    /// True if the record holds a usable value for this field.
    ///
    /// Phone, CPF and e-mail must also pass their structural check: a value
    /// that is present but malformed counts as missing.
    pub fn is_satisfied_by(&self, record: &CustomerRecord) -> bool {
        let identity = &record.identity;
        match self {
            Self::FullName => identity.full_name.is_some(),
            Self::Phone => identity.phone.as_deref().is_some_and(is_valid_phone),
            Self::NationalId => identity
                .national_id
                .as_deref()
                .is_some_and(is_valid_national_id),
            Self::Email => identity.email.as_deref().is_some_and(is_valid_email),
            Self::Address => identity.address.is_some(),
            Self::City => record.location.city.is_some(),
            Self::Item => record.service.item.is_some(),
            Self::QuoteAccepted => record.service.quote_decision.is_accepted(),
        }
    }
}

/// Evaluates a record against the mandatory field set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionPolicy;

impl CompletionPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Mandatory fields not yet satisfied, in fixed order.
    pub fn missing(&self, record: &CustomerRecord) -> Vec<MandatoryField> {
        MandatoryField::ALL
            .iter()
            .copied()
            .filter(|field| !field.is_satisfied_by(record))
            .collect()
    }

    /// Labels of the missing mandatory fields, in fixed order.
    pub fn missing_fields(&self, record: &CustomerRecord) -> Vec<&'static str> {
        self.missing(record).iter().map(MandatoryField::label).collect()
    }

    pub fn is_complete(&self, record: &CustomerRecord) -> bool {
        MandatoryField::ALL
            .iter()
            .all(|field| field.is_satisfied_by(record))
    }

    /// The single authoritative "ready to leave the automated flow" gate.
    pub fn can_handoff(&self, record: &CustomerRecord, stage: Stage) -> bool {
        stage == Stage::QuoteConfirmed && self.is_complete(record)
    }
}
