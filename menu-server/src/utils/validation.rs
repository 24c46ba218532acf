//! Input validation helpers
//!
//! Length, URL and e-mail checks go through `validator` on the form types;
//! what is left here is parsing of free-typed numbers.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a price typed in a form: accepts `12.5`, `12,50`; rejects negatives.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized)
        .ok()
        .filter(|p| !p.is_sign_negative() || p.is_zero())
}
