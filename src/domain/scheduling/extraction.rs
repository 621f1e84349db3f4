//! Extraction results produced by the entity-extraction collaborator.
//!
//! The language model turns a free-text message into a fixed-shape JSON
//! object. This module holds that shape, the conversion into the partial
//! field maps the [`CustomerRecord`](super::CustomerRecord) accepts, and the
//! parser that turns raw model output into an [`ExtractionResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::customer::{
    identity_keys, location_keys, quantity_value, service_keys, text_value, FieldMap,
    QuoteDecision,
};

/// Maximum accepted model output (64KB).
pub const MAX_OUTPUT_LENGTH: usize = 64_000;

/// Errors that can occur while parsing model output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Model output too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Model output is not a JSON object")]
    NotAnObject,

    #[error("Extractor unavailable: {0}")]
    Unavailable(String),
}

/// Structured data extracted from one customer message.
///
/// Absent fields are `None`; blank strings never stand in for "unset".
/// `Default` is the best-effort result used when the extractor fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub landmark: Option<String>,

    pub item: Option<String>,
    pub quantity: Option<u32>,
    pub size: Option<String>,

    pub city: Option<String>,

    pub photo_sent: Option<bool>,
    pub accepts_quote: QuoteDecision,
    pub wants_to_schedule: bool,

    /// Free-text hint of the stage the model believes the dialogue is in.
    pub detected_stage: Option<String>,
}

impl ExtractionResult {
    /// True when the customer accepted the quote in this message.
    pub fn accepted_quote(&self) -> bool {
        self.accepts_quote.is_accepted()
    }

    /// True when any personal identity field was extracted this turn.
    pub fn has_identity_data(&self) -> bool {
        self.full_name.is_some()
            || self.phone.is_some()
            || self.email.is_some()
            || self.national_id.is_some()
            || self.address.is_some()
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Identity fields as a partial update map.
    pub fn identity_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        put_text(&mut map, identity_keys::FULL_NAME, &self.full_name);
        put_text(&mut map, identity_keys::PHONE, &self.phone);
        put_text(&mut map, identity_keys::EMAIL, &self.email);
        put_text(&mut map, identity_keys::NATIONAL_ID, &self.national_id);
        put_text(&mut map, identity_keys::ADDRESS, &self.address);
        map
    }

    /// Service-request fields as a partial update map.
    pub fn service_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        put_text(&mut map, service_keys::ITEM, &self.item);
        put_text(&mut map, service_keys::SIZE, &self.size);
        if let Some(quantity) = self.quantity {
            map.insert(service_keys::QUANTITY.to_string(), Value::from(quantity));
        }
        if let Some(sent) = self.photo_sent {
            map.insert(service_keys::PHOTO_SENT.to_string(), Value::Bool(sent));
        }
        match self.accepts_quote {
            QuoteDecision::Accepted => {
                map.insert(service_keys::QUOTE_ACCEPTED.to_string(), Value::Bool(true));
            }
            QuoteDecision::Rejected => {
                map.insert(service_keys::QUOTE_ACCEPTED.to_string(), Value::Bool(false));
            }
            QuoteDecision::Unknown => {}
        }
        map
    }

    /// Location fields as a partial update map.
    pub fn location_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        put_text(&mut map, location_keys::CITY, &self.city);
        put_text(&mut map, location_keys::LANDMARK, &self.landmark);
        map
    }

    /// Parses raw language-model output into an extraction result.
    ///
    /// # Steps
    /// 1. Validate length and strip control characters / injection markers
    /// 2. Locate the JSON object (fenced block or first balanced braces)
    /// 3. Read each known field, normalising blanks to unset
    pub fn from_model_output(output: &str) -> Result<Self, ExtractionError> {
        let sanitized = sanitize(output)?;
        let json = locate_json_object(&sanitized);

        let value: Value =
            serde_json::from_str(&json).map_err(|e| ExtractionError::ParseError(e.to_string()))?;
        let object = value.as_object().ok_or(ExtractionError::NotAnObject)?;

        let text = |key: &str| object.get(key).and_then(text_value);
        let flag = |key: &str| object.get(key).and_then(Value::as_bool);

        Ok(Self {
            full_name: text("full_name"),
            phone: text("phone"),
            email: text("email"),
            national_id: text("national_id"),
            address: text("address"),
            landmark: text("landmark"),
            item: text("item"),
            quantity: object.get("quantity").and_then(quantity_value),
            size: text("size"),
            city: text("city"),
            photo_sent: flag("photo_sent"),
            accepts_quote: QuoteDecision::from_answer(flag("accepts_quote")),
            wants_to_schedule: flag("wants_to_schedule").unwrap_or(false),
            detected_stage: text("detected_stage"),
        })
    }
}

fn put_text(map: &mut FieldMap, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

const INJECTION_MARKERS: [&str; 11] = [
    "```system",
    "```assistant",
    "[INST]",
    "[/INST]",
    "<|system|>",
    "<|assistant|>",
    "<|user|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
    "<</SYS>>",
];

fn sanitize(output: &str) -> Result<String, ExtractionError> {
    if output.len() > MAX_OUTPUT_LENGTH {
        return Err(ExtractionError::TooLong {
            max: MAX_OUTPUT_LENGTH,
            actual: output.len(),
        });
    }

    let mut cleaned: String = output
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect();

    for marker in INJECTION_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    Ok(cleaned)
}

/// Returns the JSON object text inside the output, or the trimmed output.
fn locate_json_object(output: &str) -> String {
    let trimmed = output.trim();

    for fence in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(start) = trimmed.find(fence) {
            let body = start + fence.len();
            if let Some(end) = trimmed[body..].find("```") {
                return trimmed[body..body + end].trim().to_string();
            }
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(object) = balanced_object(trimmed, start) {
            return object;
        }
    }

    trimmed.to_string()
}

fn balanced_object(s: &str, start: usize) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
