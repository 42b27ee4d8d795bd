use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use serde_json::Value;

use super::modes;
use super::tool_specs;

/// Load-bearing parity check: for every tool the advertised `what` enum must
/// equal the handler-table mode set exactly.
#[test]
fn schema_enum_matches_handler_table() {
    let specs = tool_specs();
    assert_eq!(specs.len(), modes::TOOLS.len());

    for spec in &specs {
        let advertised: BTreeSet<String> = spec.input_schema["properties"]["what"]["enum"]
            .as_array()
            .expect("enum array")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        let handlers: BTreeSet<String> = modes::modes_for(&spec.name)
            .expect("known tool")
            .iter()
            .map(|mode| (*mode).to_string())
            .collect();
        assert_eq!(advertised, handlers, "enum drift for tool `{}`", spec.name);
    }
}

#[test]
fn tool_names_match_the_fixed_set() {
    let names: Vec<String> = tool_specs().into_iter().map(|spec| spec.name).collect();
    assert_eq!(
        names,
        vec!["observe", "analyze", "interact", "generate", "configure"]
    );
}

#[test]
fn every_schema_requires_what() {
    for spec in tool_specs() {
        assert_eq!(
            spec.input_schema["required"],
            serde_json::json!(["what"]),
            "tool `{}`",
            spec.name
        );
    }
}
