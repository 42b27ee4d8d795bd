//! Entry-size validation.

use serde_json::Value;

/// Serialized-size cap per entry.
pub const MAX_ENTRY_BYTES: usize = 64 * 1024;

/// Entries whose cheap size estimate stays under this bound skip the exact
/// (re-serializing) check. The estimate ignores punctuation and escaping;
/// JSON escaping inflates a string by at most 6x, so an estimate under 1/8
/// of the cap can never serialize past it.
const FAST_PATH_BOUND: usize = MAX_ENTRY_BYTES / 8;

/// True iff the entry's serialized form exceeds [`MAX_ENTRY_BYTES`].
pub fn entry_too_large(value: &Value) -> bool {
    if approximate_size(value) <= FAST_PATH_BOUND {
        return false;
    }
    match serde_json::to_string(value) {
        Ok(serialized) => serialized.len() > MAX_ENTRY_BYTES,
        // Unserializable input counts as oversize rather than panicking a
        // batch.
        Err(_) => true,
    }
}

fn approximate_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(_) => 5,
        Value::Number(_) => 20,
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(approximate_size).sum::<usize>() + items.len(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| key.len() + approximate_size(item))
            .sum::<usize>(),
    }
}

#[cfg(test)]
#[path = "validate.test.rs"]
mod tests;
