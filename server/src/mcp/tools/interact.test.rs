use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::CommandResult;
use gasoline_protocol::CommandStatus;

use super::super::Args;
use super::handle;
use crate::state::ServerState;

fn args(value: serde_json::Value) -> Args {
    value.as_object().expect("object").clone()
}

fn state() -> Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

fn error_body(result: &gasoline_protocol::ToolResult) -> Value {
    serde_json::from_str(result.first_text().expect("text")).expect("json body")
}

#[tokio::test]
async fn click_without_selector_is_missing_param() {
    let state = state();
    let (result, meta) = handle(&state, "click", &args(json!({"what": "click"}))).await;
    assert!(result.is_error());
    assert_eq!(error_body(&result)["error_code"], json!("missing_param"));
    assert!(meta.is_none());
}

#[tokio::test]
async fn injection_selector_is_rejected_before_enqueue() {
    let state = state();
    let (result, _) = handle(
        &state,
        "click",
        &args(json!({"what": "click", "selector": "<script>x</script>"})),
    )
    .await;
    assert_eq!(
        error_body(&result)["error_code"],
        json!("selector_injection_detected")
    );
    assert_eq!(state.queue.depth(), 0);
}

#[tokio::test]
async fn timeout_produces_structured_error_with_recovery_plan() {
    let state = state();
    let (result, _) = handle(
        &state,
        "click",
        &args(json!({"what": "click", "selector": "#nope", "timeout_ms": 30})),
    )
    .await;
    let body = error_body(&result);
    assert_eq!(body["error_code"], json!("timeout"));
    assert!(body["recovery_plan"]["ordered_recovery_steps"].is_array());
    assert!(!state.ready_for_interaction());
}

#[tokio::test]
async fn completed_command_round_trips_payload() {
    let state = state();
    let worker = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            // Play the extension: poll until the command appears, then
            // complete it.
            loop {
                if let Some(cmd) = state.queue.take_next("ext") {
                    state.queue.complete(CommandResult::complete(
                        cmd.correlation_id,
                        json!({"clicked": true}),
                        42,
                    ));
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let (result, meta) = handle(
        &state,
        "click",
        &args(json!({"what": "click", "selector": "#go", "timeout_ms": 2000})),
    )
    .await;
    worker.await.expect("worker");

    assert!(!result.is_error());
    let body = error_body(&result);
    assert_eq!(body["status"], json!("complete"));
    assert_eq!(body["result"]["clicked"], json!(true));
    let meta = meta.expect("meta for completed command");
    assert_eq!(meta.status, CommandStatus::Complete);
    assert_eq!(meta.elapsed_ms, 42);
}

#[tokio::test]
async fn navigate_requires_http_url() {
    let state = state();
    let (result, _) = handle(
        &state,
        "navigate",
        &args(json!({"what": "navigate", "url": "file:///etc/passwd"})),
    )
    .await;
    assert_eq!(error_body(&result)["error_code"], json!("invalid_param"));
}

#[tokio::test]
async fn draw_marks_the_watermark() {
    let state = state();
    assert_eq!(state.annotations.last_draw_started_at_ms(), 0);
    let (_result, _) = handle(
        &state,
        "draw",
        &args(json!({"what": "draw", "timeout_ms": 20})),
    )
    .await;
    assert!(state.annotations.last_draw_started_at_ms() > 0);
}
