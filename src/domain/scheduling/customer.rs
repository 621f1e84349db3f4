//! Customer record collected over the conversation.
//!
//! The record is a plain mutable aggregate. Updates take a partial mapping
//! of field names to JSON values: unknown keys and `null` values are
//! ignored, provided keys overwrite whatever was stored (last write wins).
//! No validation happens here; structural checks live in
//! [`validation`](super::validation) and are advisory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Timestamp;

/// Partial field-name → value mapping accepted by the update operations.
pub type FieldMap = serde_json::Map<String, Value>;

/// Field names understood by [`CustomerRecord::update_identity`].
pub mod identity_keys {
    pub const FULL_NAME: &str = "full_name";
    pub const PHONE: &str = "phone";
    pub const EMAIL: &str = "email";
    pub const NATIONAL_ID: &str = "national_id";
    pub const ADDRESS: &str = "address";
}

/// Field names understood by [`CustomerRecord::update_service`].
pub mod service_keys {
    pub const ITEM: &str = "item";
    pub const QUANTITY: &str = "quantity";
    pub const SIZE: &str = "size";
    pub const PHOTO_SENT: &str = "photo_sent";
    pub const QUOTED_PRICE: &str = "quoted_price";
    pub const QUOTE_ACCEPTED: &str = "quote_accepted";
}

/// Field names understood by [`CustomerRecord::update_location`].
pub mod location_keys {
    pub const CITY: &str = "city";
    pub const LANDMARK: &str = "landmark";
}

/// Kind of upholstered item the customer wants cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Sofa,
    Armchair,
    Chair,
    Mattress,
    Headboard,
    CarSeat,
    Other,
}

impl ItemType {
    /// Maps a free-text item name (Portuguese or English) to an item type.
    ///
    /// Anything unrecognised is `Other`; parsing never fails.
    pub fn parse(raw: &str) -> Self {
        let text = fold_accents(&raw.trim().to_lowercase()).replace('_', " ");

        if (text.contains("banco") || text.contains("assento")) && text.contains("carro")
            || text.contains("car seat")
        {
            Self::CarSeat
        } else if text.contains("sofa") {
            Self::Sofa
        } else if text.contains("poltrona") || text.contains("armchair") {
            Self::Armchair
        } else if text.contains("cadeira") || text.contains("chair") {
            Self::Chair
        } else if text.contains("colchao") || text.contains("mattress") {
            Self::Mattress
        } else if text.contains("cabeceira") || text.contains("headboard") {
            Self::Headboard
        } else {
            Self::Other
        }
    }

    /// Customer-facing name of the item.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sofa => "sofá",
            Self::Armchair => "poltrona",
            Self::Chair => "cadeira",
            Self::Mattress => "colchão",
            Self::Headboard => "cabeceira",
            Self::CarSeat => "banco de carro",
            Self::Other => "outro item",
        }
    }
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// The customer's answer to the quote.
///
/// Three-valued on purpose: "not answered yet" must never collapse into
/// "rejected".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteDecision {
    #[default]
    Unknown,
    Accepted,
    Rejected,
}

impl QuoteDecision {
    /// Converts a nullable boolean answer.
    pub fn from_answer(answer: Option<bool>) -> Self {
        match answer {
            Some(true) => Self::Accepted,
            Some(false) => Self::Rejected,
            None => Self::Unknown,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// True once the customer answered either way.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Personal data needed to register the appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Brazilian taxpayer number (CPF).
    pub national_id: Option<String>,
    pub address: Option<String>,
}

/// What the customer wants cleaned and the quote given for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub item: Option<ItemType>,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub photo_sent: bool,
    pub quoted_price: Option<f64>,
    pub quote_decision: QuoteDecision,
}

/// Where the service would happen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceLocation {
    pub city: Option<String>,
    pub landmark: Option<String>,
}

/// Everything collected from one customer during a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub identity: CustomerIdentity,
    pub service: ServiceRequest,
    pub location: ServiceLocation,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CustomerRecord {
    /// Creates an empty record at conversation start.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            identity: CustomerIdentity::default(),
            service: ServiceRequest::default(),
            location: ServiceLocation::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the provided identity fields.
    ///
    /// Returns how many fields were written.
    pub fn update_identity(&mut self, fields: &FieldMap) -> usize {
        use identity_keys::*;

        let identity = &mut self.identity;
        let written = [
            assign(&mut identity.full_name, fields.get(FULL_NAME).and_then(text_value)),
            assign(&mut identity.phone, fields.get(PHONE).and_then(text_value)),
            assign(&mut identity.email, fields.get(EMAIL).and_then(text_value)),
            assign(&mut identity.national_id, fields.get(NATIONAL_ID).and_then(text_value)),
            assign(&mut identity.address, fields.get(ADDRESS).and_then(text_value)),
        ]
        .into_iter()
        .filter(|w| *w)
        .count();

        self.touch(written)
    }

    /// Overwrites the provided service-request fields.
    ///
    /// Returns how many fields were written.
    pub fn update_service(&mut self, fields: &FieldMap) -> usize {
        use service_keys::*;

        let service = &mut self.service;
        let mut written = [
            assign(
                &mut service.item,
                fields.get(ITEM).and_then(text_value).map(|s| ItemType::parse(&s)),
            ),
            assign(&mut service.quantity, fields.get(QUANTITY).and_then(quantity_value)),
            assign(&mut service.size, fields.get(SIZE).and_then(text_value)),
            assign(&mut service.quoted_price, fields.get(QUOTED_PRICE).and_then(price_value)),
        ]
        .into_iter()
        .filter(|w| *w)
        .count();

        if let Some(sent) = fields.get(PHOTO_SENT).and_then(Value::as_bool) {
            service.photo_sent = sent;
            written += 1;
        }
        if let Some(accepted) = fields.get(QUOTE_ACCEPTED).and_then(Value::as_bool) {
            service.quote_decision = QuoteDecision::from_answer(Some(accepted));
            written += 1;
        }

        self.touch(written)
    }

    /// Overwrites the provided location fields.
    ///
    /// Returns how many fields were written.
    pub fn update_location(&mut self, fields: &FieldMap) -> usize {
        use location_keys::*;

        let location = &mut self.location;
        let written = [
            assign(&mut location.city, fields.get(CITY).and_then(text_value)),
            assign(&mut location.landmark, fields.get(LANDMARK).and_then(text_value)),
        ]
        .into_iter()
        .filter(|w| *w)
        .count();

        self.touch(written)
    }

    fn touch(&mut self, written: usize) -> usize {
        if written > 0 {
            self.updated_at = Timestamp::now();
        }
        written
    }
}

impl Default for CustomerRecord {
    fn default() -> Self {
        Self::new()
    }
}

fn assign<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

/// Reads a non-blank string; numbers are accepted in their decimal form.
pub(super) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(super) fn quantity_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|q| u32::try_from(q).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `179`, `"179.5"`, `"179,00"`, `"R$ 1.179"` and `"R$ 1.179,00"`.
///
/// Without a decimal comma, dots that only separate groups of three digits
/// are thousands separators. Non-finite amounts are rejected.
fn price_value(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let amount = s.trim().trim_start_matches("R$").trim();
            let normalized = if amount.contains(',') {
                amount.replace('.', "").replace(',', ".")
            } else if has_thousands_groups(amount) {
                amount.replace('.', "")
            } else {
                amount.to_string()
            };
            normalized.parse().ok()
        }
        _ => None,
    };
    amount.filter(|a: &f64| a.is_finite())
}

/// True for `1.179` or `12.345.678`: a 1-3 digit head followed by
/// dot-separated groups of exactly three digits.
fn has_thousands_groups(amount: &str) -> bool {
    let mut groups = amount.split('.');
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let mut rest = groups.peekable();
    head_ok
        && rest.peek().is_some()
        && rest.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}
