use axum::http::HeaderMap;
use axum::http::HeaderValue;
use pretty_assertions::assert_eq;

use super::acceptable_content_type;
use super::client_id_from;
use super::origin_allowed;
use crate::state::ServerState;

#[test]
fn absent_content_type_is_accepted() {
    assert!(acceptable_content_type(None));
}

#[test]
fn json_content_types_are_accepted() {
    assert!(acceptable_content_type(Some("application/json")));
    assert!(acceptable_content_type(Some("application/json; charset=utf-8")));
    assert!(acceptable_content_type(Some("Application/JSON")));
}

#[test]
fn other_content_types_are_rejected() {
    assert!(!acceptable_content_type(Some("text/plain")));
    assert!(!acceptable_content_type(Some("application/x-www-form-urlencoded")));
}

#[test]
fn client_id_defaults_when_header_missing() {
    let headers = HeaderMap::new();
    assert_eq!(client_id_from(&headers), "default");

    let mut headers = HeaderMap::new();
    headers.insert("x-gasoline-client", HeaderValue::from_static("cli-1"));
    assert_eq!(client_id_from(&headers), "cli-1");
}

#[test]
fn localhost_and_extension_origins_are_allowed() {
    let state = ServerState::new(std::env::temp_dir().join("gasoline-test"), 0);
    assert!(origin_allowed(&state, "http://localhost:3000"));
    assert!(origin_allowed(&state, "http://127.0.0.1:5173"));
    assert!(origin_allowed(&state, "chrome-extension://gasoline-devtools"));
    assert!(!origin_allowed(&state, "https://evil.example.com"));
}
