use serde_json::json;

use super::MAX_ENTRY_BYTES;
use super::entry_too_large;

#[test]
fn small_entries_pass() {
    assert!(!entry_too_large(&json!({"level": "info", "message": "hi"})));
}

#[test]
fn entry_at_exactly_max_size_is_accepted() {
    // Measure the serialization overhead, then size the message so the
    // serialized entry lands exactly on the cap.
    let base = serde_json::to_string(&json!({"level": "info", "message": ""}))
        .expect("serializable")
        .len();
    let message = "a".repeat(MAX_ENTRY_BYTES - base);

    let at_cap = json!({"level": "info", "message": message});
    assert_eq!(
        serde_json::to_string(&at_cap).expect("serializable").len(),
        MAX_ENTRY_BYTES
    );
    assert!(!entry_too_large(&at_cap));

    let over = json!({"level": "info", "message": format!("{message}a")});
    assert!(entry_too_large(&over));
}

#[test]
fn escaping_does_not_sneak_past_the_fast_path() {
    // Newlines serialize to two bytes each; the raw length alone would look
    // safely small.
    let message = "\n".repeat(MAX_ENTRY_BYTES);
    assert!(entry_too_large(&json!({"level": "info", "message": message})));
}
