//! Output rendering for tool results.

use clap::ValueEnum;
use serde_json::Value;

use gasoline_protocol::ToolResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        write!(f, "{name}")
    }
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("invalid format `{other}`; valid: human, json, csv")),
        }
    }
}

pub fn render(result: &ToolResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Human => render_human(result),
        OutputFormat::Csv => render_csv(result),
    }
}

fn render_human(result: &ToolResult) -> String {
    let mut out = String::new();
    if result.is_error() {
        out.push_str("error:\n");
    }
    for block in &result.content {
        // Pretty-print JSON payloads; pass prose through.
        match serde_json::from_str::<Value>(&block.text) {
            Ok(value) => {
                out.push_str(
                    &serde_json::to_string_pretty(&value).unwrap_or_else(|_| block.text.clone()),
                );
            }
            Err(_) => out.push_str(&block.text),
        }
        out.push('\n');
    }
    if let Some(warning) = result.meta("diagnostic_warning").and_then(Value::as_str) {
        out.push_str(&format!("warning: {warning}\n"));
    }
    out.trim_end().to_string()
}

/// CSV: find the first array-of-objects in the result body and tabulate it.
fn render_csv(result: &ToolResult) -> String {
    let Some(text) = result.first_text() else {
        return String::new();
    };
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    let Some(rows) = find_object_rows(&body) else {
        // Nothing tabular; fall back to the JSON body.
        return body.to_string();
    };

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Some(obj) = row.as_object() {
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut out = columns.join(",");
    out.push('\n');
    for row in rows {
        let Some(obj) = row.as_object() else { continue };
        let cells: Vec<String> = columns
            .iter()
            .map(|column| csv_cell(obj.get(column)))
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn find_object_rows(body: &Value) -> Option<&Vec<Value>> {
    let obj = body.as_object()?;
    for key in ["entries", "events", "snapshots", "clients"] {
        if let Some(Value::Array(rows)) = obj.get(key) {
            if rows.iter().all(Value::is_object) && !rows.is_empty() {
                return obj.get(key).and_then(Value::as_array);
            }
        }
    }
    None
}

fn csv_cell(value: Option<&Value>) -> String {
    let rendered = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if rendered.contains(',') || rendered.contains('"') || rendered.contains('\n') {
        format!("\"{}\"", rendered.replace('"', "\"\""))
    } else {
        rendered
    }
}

#[cfg(test)]
#[path = "format.test.rs"]
mod tests;
