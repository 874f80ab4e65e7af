//! Context-size estimation over decoded response records.

use serde_json::Value;

/// Rough chars-per-token divisor for English text.
const CHARS_PER_TOKEN: u64 = 4;

/// Approximate how many tokens the given response records consume.
///
/// A pure, stateless heuristic: sums the character lengths of the textual
/// fields of each record and divides by [`CHARS_PER_TOKEN`], rounding up.
/// Records and fields it does not recognize count as zero; a missing
/// `output` or `text` never panics.
#[must_use]
pub fn approximate_tokens_used(items: &[Value]) -> u64 {
    let chars: u64 = items.iter().map(record_chars).sum();
    chars.div_ceil(CHARS_PER_TOKEN)
}

fn record_chars(item: &Value) -> u64 {
    match item.get("type").and_then(Value::as_str) {
        Some("message") => item
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().map(content_block_chars).sum())
            .unwrap_or(0),
        Some("function_call") => str_len(item.get("name")) + str_len(item.get("arguments")),
        Some("function_call_output") => str_len(item.get("output")),
        _ => 0,
    }
}

fn content_block_chars(block: &Value) -> u64 {
    match block.get("type").and_then(Value::as_str) {
        Some("output_text" | "input_text") => str_len(block.get("text")),
        Some("refusal") => str_len(block.get("refusal")),
        _ => 0,
    }
}

fn str_len(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_str).map_or(0, |s| s.len() as u64)
}
