//! The tool result envelope returned by `tools/call`.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One content block inside a tool result. Only `text` blocks are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// A tool result: `{content: [...], isError?, metadata?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, Value>>,
}

impl ToolResult {
    /// A single-text-block success result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: None,
            metadata: None,
        }
    }

    /// A success result whose text block is the compact JSON rendering of
    /// `value`.
    pub fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.is_error == Some(true)
    }

    /// Append a text block after the primary one.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(ContentBlock::text(text));
    }

    /// Text of the first block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| block.text.as_str())
    }

    /// Insert (or overwrite) a metadata key.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.metadata
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
    }

    /// Read a metadata key.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|meta| meta.get(key))
    }
}

#[cfg(test)]
#[path = "envelope.test.rs"]
mod tests;
