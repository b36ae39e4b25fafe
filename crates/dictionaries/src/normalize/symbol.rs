//! Symbol and numeric helpers shared by the adapters.

use rust_decimal::Decimal;

/// Replaces the first occurrence of `from` with a space.
///
/// Sources disagree on the class separator (`BRK-B`, `BRK.B`, `BRK/B`);
/// the canonical symbol uses a single space.
pub fn space_separator(symbol: &str, from: char) -> String {
    symbol.replacen(from, " ", 1)
}

/// Returns the text after the first `prefix`, up to the next `prefix`.
///
/// `"M_AAPL/USD"` with prefix `"M_"` yields `"AAPL/USD"`. `None` when the
/// prefix is absent.
pub fn segment_after<'a>(code: &'a str, prefix: &str) -> Option<&'a str> {
    code.split(prefix).nth(1)
}

/// Converts a numeric lot size into a board lot, if it is a positive integer.
pub fn lot_from_f64(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Parses a decimal string the way the exchanges format them
/// (`"0.00010000"`, occasionally scientific notation).
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .map(|d| d.normalize())
}
