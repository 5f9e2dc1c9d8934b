//! Total cell coercions. None of these fail: bad input degrades to a default.

use crate::types::CellValue;

/// Category label used for empty cells on the categorical axis.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Numeric view of a cell. Empty, non-numeric and NaN all become 0.
///
/// Text is trimmed before parsing, so `" 30 "` is 30. Infinite inputs pass
/// through unchanged and are dropped later by the projection validity check.
/// Only the spelling `Infinity` (optionally signed) or a numeric overflow such
/// as `1e400` counts as infinite; `inf` and friends are plain text.
pub fn as_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) if n.is_nan() => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Text(s) => match parse_number(s) {
            Some(n) if !n.is_nan() => n,
            _ => 0.0,
        },
        CellValue::Empty => 0.0,
    }
}

/// Strict numeric view: `None` unless the cell really holds a number.
pub fn parse_strict(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_number(s).filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Categorical view: the literal "Unknown" for missing cells.
pub fn as_category(cell: &CellValue) -> String {
    if cell.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        cell.to_string()
    }
}

/// Raw text used for filtering and ancillary lookups (empty for missing).
pub fn as_text(cell: &CellValue) -> String {
    cell.to_string()
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let n = trimmed.parse::<f64>().ok()?;
    if n.is_infinite() && !is_infinity_literal(trimmed) {
        return None;
    }
    Some(n)
}

/// `Infinity`, `+Infinity`, `-Infinity`, or anything with a digit in it
/// (an exponent too large for f64).
fn is_infinity_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    unsigned == "Infinity" || unsigned.bytes().any(|b| b.is_ascii_digit())
}
