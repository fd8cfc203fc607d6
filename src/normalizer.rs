//! Turns localized price fragments ("1 234,56 грн", "1,234.56") into decimals.
//!
//! Separator handling is best-effort. Retail markup mixes "1 234,56" and
//! "1,234.56" styles, so a lone separator type is always read as the decimal
//! point and "1.234" comes out as 1.234, never 1234.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a price fragment, returning `None` unless it yields a positive number.
pub fn normalize(text: &str) -> Option<Decimal> {
    if is_negative(text) {
        return None;
    }

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let digits = digits.trim_matches(|c| c == ',' || c == '.');
    if digits.is_empty() {
        return None;
    }

    let canonical = match (digits.find(','), digits.find('.')) {
        // The earlier separator type groups thousands.
        (Some(comma), Some(period)) if comma < period => digits.replace(',', ""),
        (Some(_), Some(_)) => digits.replace('.', "").replace(',', "."),
        (Some(_), None) => digits.replace(',', "."),
        _ => digits.to_string(),
    };

    let value = Decimal::from_str(&canonical).ok()?;
    if value > Decimal::ZERO { Some(value) } else { None }
}

// A minus sign glued to the first digit ("-5", "−5").
fn is_negative(text: &str) -> bool {
    let Some(first_digit) = text.find(|c: char| c.is_ascii_digit()) else {
        return false;
    };
    matches!(text[..first_digit].chars().last(), Some('-') | Some('−'))
}
