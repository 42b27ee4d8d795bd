use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::TelemetryParams;
use crate::state::ServerState;

fn state() -> std::sync::Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

#[tokio::test]
async fn health_answers_ok() {
    let response = super::health(State(state())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn telemetry_rejects_unknown_type() {
    let response = super::telemetry(
        State(state()),
        Query(TelemetryParams {
            kind: "bogus".to_string(),
            limit: None,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn telemetry_serves_known_types() {
    let state = state();
    state
        .capture
        .ingest_logs(vec![serde_json::json!({"level": "info", "message": "x"})]);
    let response = super::telemetry(
        State(state),
        Query(TelemetryParams {
            kind: "logs".to_string(),
            limit: Some(10),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_client_is_not_found() {
    let response = super::get_client(State(state()), Path("ghost".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shutdown_cancels_the_token() {
    let state = state();
    assert!(!state.shutdown.is_cancelled());
    let response = super::shutdown(State(std::sync::Arc::clone(&state))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.shutdown.is_cancelled());
}
