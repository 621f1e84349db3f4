//! Structural checks for customer-provided data.
//!
//! These are format checks only (digit counts, e-mail shape). They feed
//! both the advisory `invalid-data` findings and the completeness policy,
//! which treats a structurally invalid value as missing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Digits in a CPF.
pub const NATIONAL_ID_DIGITS: usize = 11;

/// Minimum digits in a phone number, area code included.
pub const MIN_PHONE_DIGITS: usize = 10;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Eleven digits, not all of them the same.
///
/// Punctuation (`123.456.789-09`) is ignored.
pub fn is_valid_national_id(raw: &str) -> bool {
    let digits = digits(raw);
    if digits.len() != NATIONAL_ID_DIGITS {
        return false;
    }
    let first = digits.as_bytes()[0];
    !digits.bytes().all(|b| b == first)
}

/// At least ten digits once punctuation is stripped.
pub fn is_valid_phone(raw: &str) -> bool {
    digits(raw).len() >= MIN_PHONE_DIGITS
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_PATTERN.is_match(raw.trim())
}
