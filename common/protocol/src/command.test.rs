use pretty_assertions::assert_eq;
use serde_json::json;

use super::CommandResult;
use super::CommandStatus;
use super::CorrelationId;

#[test]
fn mint_embeds_tool_name_and_three_segments() {
    let id = CorrelationId::mint("click");
    assert!(id.as_str().starts_with("click_"));

    let segments: Vec<&str> = id.as_str().splitn(3, '_').collect();
    assert_eq!(segments.len(), 3);
    assert!(segments[1].parse::<i64>().expect("epoch millis") > 0);
    assert!(!segments[2].is_empty());
}

#[test]
fn minted_ids_are_unique() {
    let a = CorrelationId::mint("query");
    let b = CorrelationId::mint("query");
    assert_ne!(a, b);
}

#[test]
fn status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(CommandStatus::Timeout).expect("serializable"),
        json!("timeout")
    );
}

#[test]
fn hard_failures_are_timeout_and_expired() {
    assert!(CommandStatus::Timeout.is_hard_failure());
    assert!(CommandStatus::Expired.is_hard_failure());
    assert!(!CommandStatus::Complete.is_hard_failure());
    assert!(!CommandStatus::Error.is_hard_failure());
}

#[test]
fn result_final_flag_uses_wire_name() {
    let result = CommandResult::complete("x_1_a".into(), json!({"clicked": true}), 12);
    let value = serde_json::to_value(&result).expect("serializable");
    assert_eq!(value["final"], json!(true));
    assert_eq!(value["status"], json!("complete"));

    let parsed: CommandResult = serde_json::from_value(json!({
        "correlation_id": "x_1_a",
        "status": "error",
    }))
    .expect("defaults fill in");
    assert_eq!(parsed.elapsed_ms, 0);
    assert!(!parsed.is_final);
}
