use pretty_assertions::assert_eq;
use serde_json::json;

use gasoline_protocol::ToolResult;

use super::OutputFormat;
use super::render;

#[test]
fn json_format_includes_the_envelope() {
    let result = ToolResult::json(&json!({"count": 2}));
    let out = render(&result, OutputFormat::Json);
    assert!(out.contains("\"content\""));
    assert!(out.contains("count"));
}

#[test]
fn human_format_pretty_prints_json_bodies() {
    let result = ToolResult::json(&json!({"count": 2}));
    let out = render(&result, OutputFormat::Human);
    assert!(out.contains("\"count\": 2"));
}

#[test]
fn human_format_flags_errors_and_warnings() {
    let mut result = ToolResult::json(&json!({"error_code": "timeout"}));
    result.is_error = Some(true);
    result.set_meta("diagnostic_warning", json!("unusually fast"));

    let out = render(&result, OutputFormat::Human);
    assert!(out.starts_with("error:"));
    assert!(out.contains("warning: unusually fast"));
}

#[test]
fn csv_format_tabulates_entries() {
    let result = ToolResult::json(&json!({
        "entries": [
            {"level": "error", "message": "boom"},
            {"level": "warn", "message": "slow, but fine"},
        ],
        "count": 2,
    }));
    let out = render(&result, OutputFormat::Csv);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "level,message");
    assert_eq!(lines[1], "error,boom");
    // Commas are quoted.
    assert_eq!(lines[2], "warn,\"slow, but fine\"");
}

#[test]
fn csv_falls_back_to_json_without_rows() {
    let result = ToolResult::json(&json!({"status": "ok"}));
    let out = render(&result, OutputFormat::Csv);
    assert!(out.contains("\"status\""));
}

#[test]
fn parse_accepts_the_three_formats() {
    assert_eq!(OutputFormat::parse("human"), Ok(OutputFormat::Human));
    assert_eq!(OutputFormat::parse("json"), Ok(OutputFormat::Json));
    assert_eq!(OutputFormat::parse("csv"), Ok(OutputFormat::Csv));
    assert!(OutputFormat::parse("xml").is_err());
}
