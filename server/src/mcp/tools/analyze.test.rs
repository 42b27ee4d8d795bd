use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::AnnotationSession;
use gasoline_protocol::CommandResult;

use super::super::Args;
use super::handle;
use crate::state::ServerState;

fn args(value: serde_json::Value) -> Args {
    value.as_object().expect("object").clone()
}

fn state() -> Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

fn body_of(result: &gasoline_protocol::ToolResult) -> Value {
    serde_json::from_str(result.first_text().expect("text")).expect("json body")
}

fn session(tab_id: &str, timestamp: i64) -> AnnotationSession {
    AnnotationSession {
        tab_id: tab_id.to_string(),
        page_url: "http://localhost/page".to_string(),
        screenshot_path: "/tmp/shot.png".to_string(),
        annotations: Vec::new(),
        timestamp,
    }
}

#[tokio::test]
async fn dom_query_requires_selector() {
    let state = state();
    let result = handle(&state, "dom", &args(json!({"what": "dom"}))).await;
    assert!(result.is_error());
    assert_eq!(body_of(&result)["error_code"], json!("missing_param"));
}

#[tokio::test]
async fn dom_query_round_trips_through_the_queue() {
    let state = state();
    let worker = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                if let Some(cmd) = state.queue.take_next("ext") {
                    assert_eq!(cmd.tool, "query");
                    state.queue.complete(CommandResult::complete(
                        cmd.correlation_id,
                        json!({"matches": 2, "tag": "button"}),
                        15,
                    ));
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let result = handle(
        &state,
        "dom",
        &args(json!({"what": "dom", "selector": "#app button", "timeout_ms": 2000})),
    )
    .await;
    worker.await.expect("worker");

    assert!(!result.is_error());
    assert_eq!(body_of(&result)["result"]["matches"], json!(2));
}

#[tokio::test]
async fn annotations_without_session_and_without_wait_errors() {
    let state = state();
    let result = handle(&state, "annotations", &args(json!({"what": "annotations"}))).await;
    assert_eq!(
        body_of(&result)["error_code"],
        json!("no_actions_captured")
    );
}

#[tokio::test]
async fn annotations_returns_latest_session() {
    let state = state();
    state.annotations.store_session(session("tab-1", 100));
    state.annotations.store_session(session("tab-2", 200));

    let result = handle(&state, "annotations", &args(json!({"what": "annotations"}))).await;
    assert_eq!(body_of(&result)["session"]["tab_id"], json!("tab-2"));
}

#[tokio::test]
async fn named_session_lookup_and_miss() {
    let state = state();
    state
        .annotations
        .append_to_named_session("qa", session("t1", 1));

    let result = handle(
        &state,
        "annotations",
        &args(json!({"what": "annotations", "name": "qa"})),
    )
    .await;
    assert_eq!(
        body_of(&result)["named_session"]["pages"][0]["tab_id"],
        json!("t1")
    );

    let result = handle(
        &state,
        "annotations",
        &args(json!({"what": "annotations", "name": "missing"})),
    )
    .await;
    assert_eq!(body_of(&result)["error_code"], json!("scope_not_found"));
}

#[tokio::test]
async fn performance_mode_reads_snapshots() {
    let state = state();
    state
        .capture
        .ingest_performance_snapshots(vec![json!({"metrics": {"lcp_ms": 1200}})]);
    let result = handle(&state, "performance", &args(json!({"what": "performance"}))).await;
    assert_eq!(body_of(&result)["count"], json!(1));
    assert_eq!(
        body_of(&result)["latest"]["metrics"]["lcp_ms"],
        json!(1200)
    );
}
