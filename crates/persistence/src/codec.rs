//! Encoding of counter values to and from the strings kept in local storage.

use serde_json::{Number, Value};
use tracing::debug;

/// How the counts are laid out under their storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountsShape {
    Array,
    Scalar,
}

/// Floors a finite, non-negative number; everything else becomes 0.
pub fn sanitize_count(value: f64) -> u64 {
    if value.is_finite() && value >= 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

/// Interprets text typed by the user into a count. Besides decimals this
/// accepts unsigned `0x`, `0o` and `0b` literals, as a browser number input does.
pub fn parse_count_input(raw: &str) -> u64 {
    let trimmed = raw.trim();
    if let Some(value) = parse_radix_literal(trimmed) {
        return value;
    }
    trimmed.parse::<f64>().map(sanitize_count).unwrap_or(0)
}

fn parse_radix_literal(raw: &str) -> Option<u64> {
    let radix = match raw.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(0);
    }
    // Every digit is valid, so the only failure left is overflow.
    Some(u64::from_str_radix(digits, radix).unwrap_or(u64::MAX))
}

fn number_to_count(number: &Number) -> u64 {
    number
        .as_u64()
        .unwrap_or_else(|| number.as_f64().map(sanitize_count).unwrap_or(0))
}

/// Decodes `len` counts. Corruption is isolated per element: anything that is
/// not a finite number >= 0 decodes as 0, and an unreadable document decodes
/// as all zeros. A bare number is accepted as the first slot's value.
pub fn decode_counts(raw: Option<&str>, len: usize) -> Vec<u64> {
    let mut counts = vec![0; len];
    let Some(raw) = raw else {
        return counts;
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "persisted counts are not valid json; using zeros");
            return counts;
        }
    };

    match parsed {
        Value::Array(items) => {
            for (slot, item) in counts.iter_mut().zip(items.iter()) {
                *slot = match item {
                    Value::Number(number) => number_to_count(number),
                    _ => 0,
                };
            }
        }
        Value::Number(number) => {
            if let Some(first) = counts.first_mut() {
                *first = number_to_count(&number);
            }
        }
        other => {
            debug!(kind = json_kind(&other), "persisted counts have an unexpected shape");
        }
    }

    counts
}

pub fn encode_counts(values: &[u64], shape: CountsShape) -> String {
    match shape {
        CountsShape::Array => Value::from(values.to_vec()).to_string(),
        CountsShape::Scalar => values.first().copied().unwrap_or(0).to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
