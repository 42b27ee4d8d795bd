//! Parsing for `gasoline <tool> <action> [--key value ...]`.
//!
//! Bridging flags (`--port`, `--format`, `--timeout`) may appear after the
//! tool words; everything else becomes a JSON argument. Bare values are
//! coerced: `true`/`false` to booleans, integers to numbers.

use serde_json::Value;

use crate::format::OutputFormat;

/// Tools reachable from the CLI.
const CLI_TOOLS: &[&str] = &["observe", "generate", "configure", "interact"];

#[derive(Debug, Clone)]
pub struct ParsedInvocation {
    pub tool: String,
    pub arguments: serde_json::Map<String, Value>,
    pub port: Option<u16>,
    pub format: Option<OutputFormat>,
    pub timeout_ms: Option<u64>,
}

pub fn parse(words: &[String]) -> Result<ParsedInvocation, String> {
    let mut iter = words.iter().peekable();

    let tool = iter
        .next()
        .ok_or_else(|| "missing tool name".to_string())?
        .clone();
    if !CLI_TOOLS.contains(&tool.as_str()) {
        return Err(format!(
            "unknown tool `{tool}`; valid tools: {}",
            CLI_TOOLS.join(", ")
        ));
    }

    let mut arguments = serde_json::Map::new();
    let mut port = None;
    let mut format = None;
    let mut timeout_ms = None;

    // The action is the tool's dispatch parameter.
    if let Some(action) = iter.peek() {
        if !action.starts_with("--") {
            let action = iter.next().map(String::clone).unwrap_or_default();
            arguments.insert("what".to_string(), Value::String(action));
        }
    }

    while let Some(word) = iter.next() {
        let Some(key) = word.strip_prefix("--") else {
            return Err(format!("unexpected bare argument `{word}`"));
        };
        let value = iter
            .next()
            .ok_or_else(|| format!("flag `--{key}` needs a value"))?;
        match key {
            "port" => {
                port = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid port `{value}`"))?,
                );
            }
            "format" => {
                format = Some(OutputFormat::parse(value)?);
            }
            "timeout" => {
                timeout_ms = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid timeout `{value}`"))?,
                );
            }
            _ => {
                arguments.insert(key.replace('-', "_"), coerce(value));
            }
        }
    }

    if !arguments.contains_key("what") {
        return Err(format!("missing action for `{tool}`"));
    }

    Ok(ParsedInvocation {
        tool,
        arguments,
        port,
        format,
        timeout_ms,
    })
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(raw.to_string()),
        },
    }
}

#[cfg(test)]
#[path = "invocation.test.rs"]
mod tests;
