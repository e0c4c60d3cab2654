use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// The result of a tool call as seen by the client: `{ content: [...], isError?, structuredContent? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// The JSON object behind the text, for tools that declare an output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolResult {
    /// A successful plain text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
            structured_content: None,
        }
    }

    /// A successful result carrying pretty-printed JSON text.
    ///
    /// Objects are also kept as structured content.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let mut result = Self::text(serde_json::to_string_pretty(value)?);
        let structured = serde_json::to_value(value)?;
        if structured.is_object() {
            result.structured_content = Some(structured);
        }
        Ok(result)
    }

    /// A failure result with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
            structured_content: None,
        }
    }

    /// A failure result rendered as `"<context>: <error>"`.
    pub fn error_with(context: impl Display, error: &dyn Display) -> Self {
        Self::error(format!("{}: {}", context, error))
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// All text content joined with newlines.
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<String> for ToolResult {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<&str> for ToolResult {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}
