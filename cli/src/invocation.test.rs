use pretty_assertions::assert_eq;
use serde_json::json;

use super::parse;
use crate::format::OutputFormat;

fn words(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

#[test]
fn tool_action_and_flags_parse() {
    let parsed = parse(&words(&[
        "observe", "errors", "--limit", "10", "--port", "7891", "--format", "json",
    ]))
    .expect("parses");
    assert_eq!(parsed.tool, "observe");
    assert_eq!(parsed.arguments["what"], json!("errors"));
    assert_eq!(parsed.arguments["limit"], json!(10));
    assert_eq!(parsed.port, Some(7891));
    assert_eq!(parsed.format, Some(OutputFormat::Json));
}

#[test]
fn values_are_coerced() {
    let parsed = parse(&words(&[
        "interact", "click", "--selector", "#go", "--wait", "true",
    ]))
    .expect("parses");
    assert_eq!(parsed.arguments["selector"], json!("#go"));
    assert_eq!(parsed.arguments["wait"], json!(true));
}

#[test]
fn kebab_flags_become_snake_case_args() {
    let parsed = parse(&words(&["observe", "network", "--url-contains", "api"]))
        .expect("parses");
    assert_eq!(parsed.arguments["url_contains"], json!("api"));
}

#[test]
fn unknown_tool_is_rejected() {
    let err = parse(&words(&["analyze", "dom"])).expect_err("rejects");
    assert!(err.contains("unknown tool"));
}

#[test]
fn missing_action_is_rejected() {
    let err = parse(&words(&["observe"])).expect_err("rejects");
    assert!(err.contains("missing action"));
}

#[test]
fn flag_without_value_is_rejected() {
    let err = parse(&words(&["observe", "errors", "--limit"])).expect_err("rejects");
    assert!(err.contains("needs a value"));
}
