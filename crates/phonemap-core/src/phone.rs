//! Phone number normalization and validation.
//!
//! Canonical form is digits only. No country-code or checksum rules apply;
//! a number is valid when its canonical form has 10 to 15 digits.

use std::collections::BTreeSet;

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Strip every non-digit character. Total and deterministic.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True iff `normalized` has between 10 and 15 digits inclusive.
pub fn validate(normalized: &str) -> bool {
    let len = normalized.len();
    normalized.bytes().all(|b| b.is_ascii_digit())
        && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&len)
}

/// Normalize and validate in one step.
pub fn canonical(raw: &str) -> Option<String> {
    let normalized = normalize(raw);
    validate(&normalized).then_some(normalized)
}

/// Parse the one-number-per-line shape used for enrollment.
///
/// Blank lines and invalid numbers are skipped, duplicates collapse. The
/// result is sorted so enrollment order does not depend on hashing.
pub fn parse_phone_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(canonical)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
