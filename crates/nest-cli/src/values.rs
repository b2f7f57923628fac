//! JSON helpers for key values.
//!
//! Values are opaque bytes to the store. These helpers only touch values
//! that parse as JSON and hand everything else back unchanged.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Re-encode JSON input without insignificant whitespace.
pub fn compact_json(input: &[u8]) -> Vec<u8> {
    match serde_json::from_slice::<Value>(input) {
        Ok(value) => serde_json::to_vec(&value).unwrap_or_else(|_| input.to_vec()),
        Err(_) => input.to_vec(),
    }
}

/// Tab-indented JSON for display.
pub fn pretty(input: &[u8]) -> Vec<u8> {
    let Ok(value) = serde_json::from_slice::<Value>(input) else {
        return input.to_vec();
    };
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    match value.serialize(&mut ser) {
        Ok(()) => out,
        Err(_) => input.to_vec(),
    }
}

pub fn is_json(input: &[u8]) -> bool {
    serde_json::from_slice::<Value>(input).is_ok()
}

/// One-line preview of a value, cut to `max` characters.
pub fn preview(input: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(input);
    let line: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max {
        return line;
    }
    let mut cut: String = line.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
