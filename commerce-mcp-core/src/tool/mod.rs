//! Tool descriptors.
//!
//! A tool is registered with the server as a [`ToolDefinition`]: a name, a
//! description, optional input and output JSON schemas, an async body and an
//! optional access predicate. Most command modules implement the typed
//! [`Tool`] trait and erase it with [`ToolDefinition::from_tool`], which
//! derives the input schema from the input type.

mod definition;
mod result;

pub use definition::{
    AccessPredicate, ToolContext, ToolDefinition, ToolFuture, ToolHandler,
};
pub use result::{ToolContent, ToolResult};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::HttpError;
use crate::session::SessionError;

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments were rejected by a validator before the body ran.
    #[error("Validation error in {tool}: {message}")]
    Validation { tool: String, message: String },

    /// Arguments did not deserialize into the tool's input type.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// Trait for implementing typed tools.
///
/// The input type derives `Deserialize` and `JsonSchema`; its schema becomes
/// the tool's advertised input schema.
///
/// ```rust
/// use commerce_mcp_core::{Tool, ToolContext, ToolError, ToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct WhoAmIInput {}
///
/// struct WhoAmI;
///
/// impl Tool for WhoAmI {
///     type Input = WhoAmIInput;
///
///     fn name(&self) -> &str { "who_am_i" }
///     fn description(&self) -> &str { "Show the API user" }
///
///     fn execute(
///         &self,
///         _input: Self::Input,
///         context: ToolContext,
///     ) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send {
///         async move { Ok(context.session().user().name.clone().into()) }
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The input type for this tool.
    type Input: DeserializeOwned + JsonSchema + Send;

    /// The name of the tool (e.g., "get_order_by_id")
    fn name(&self) -> &str;

    /// A description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with typed input
    fn execute(
        &self,
        input: Self::Input,
        context: ToolContext,
    ) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send;

    /// JSON schema for this tool's input, derived from `Input`.
    fn input_schema(&self) -> Value {
        schema_for::<Self::Input>()
    }

    /// JSON schema describing the tool's structured output, if it has one.
    fn output_schema(&self) -> Option<Value> {
        None
    }
}

/// Generate the JSON schema of a type as a plain value.
pub fn schema_for<T: JsonSchema>() -> Value {
    schemars::schema_for!(T).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = ToolError::Validation {
            tool: "cancel_order".to_string(),
            message: "reason is required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error in cancel_order: reason is required"
        );
    }

    #[test]
    fn test_string_conversions() {
        assert!(matches!(ToolError::from("boom"), ToolError::Custom(m) if m == "boom"));
        assert!(matches!(
            ToolError::from("boom".to_string()),
            ToolError::Custom(m) if m == "boom"
        ));
    }

    #[test]
    fn test_schema_for_object_type() {
        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct Input {
            id: String,
            limit: Option<u32>,
        }

        let schema = schema_for::<Input>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["id"]));
    }
}
