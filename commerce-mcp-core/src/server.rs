//! MCP server exposing registered tools over rmcp.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::registry::{RegistryError, ToolTransport};
use crate::session::Session;
use crate::tool::{ToolContent, ToolContext, ToolDefinition, ToolResult};

/// An MCP server that serves the tools installed into it.
///
/// Tools are installed through [`ToolTransport`] (normally by
/// [`crate::registry::register_tools`]) and answered on `tools/list` and
/// `tools/call`. Every call runs with the session the server was built for.
pub struct McpToolServer {
    name: String,
    version: String,
    instructions: Option<String>,
    session: Arc<Session>,
    tools: BTreeMap<String, ToolDefinition>,
}

impl McpToolServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instructions: None,
            session,
            tools: BTreeMap::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// The `tools/list` payload.
    pub fn tool_listing(&self) -> Vec<McpTool> {
        self.tools.values().map(to_mcp_tool).collect()
    }

    /// Run an installed tool by name.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<ToolResult, ErrorData> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ErrorData::invalid_params(format!("unknown tool: {}", name), None))?;

        debug!(tool = %name, "calling tool");
        let args = Value::Object(arguments.unwrap_or_default());
        let context = ToolContext::new(Arc::clone(&self.session));

        let result = match tool.call(args, context).await {
            Ok(result) => result,
            Err(err) => ToolResult::error_with(format!("Error using {}", name), &err),
        };
        Ok(if tool.output_schema().is_some() {
            with_structured_text(result)
        } else {
            result
        })
    }

    /// Serve over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!(server = %self.name, tools = self.tools.len(), "serving MCP over stdio");
        let running = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let reason = running
            .waiting()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        info!(?reason, "MCP session ended");
        Ok(())
    }
}

impl ToolTransport for McpToolServer {
    fn install(&mut self, tool: ToolDefinition) -> std::result::Result<(), RegistryError> {
        if self.tools.contains_key(tool.name()) {
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }
        debug!(tool = %tool.name(), "installed tool");
        self.tools.insert(tool.name().to_string(), tool);
        Ok(())
    }
}

impl ServerHandler for McpToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                ..Default::default()
            },
            instructions: self.instructions.clone(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_listing()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.invoke(&request.name, request.arguments)
            .await
            .map(CallToolResult::from)
    }
}

impl From<ToolResult> for CallToolResult {
    fn from(result: ToolResult) -> Self {
        let is_error = result.is_error();
        let content = result
            .content
            .into_iter()
            .map(|block| match block {
                ToolContent::Text { text } => Content::text(text),
            })
            .collect();

        let mut converted = if is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        };
        converted.structured_content = result.structured_content;
        converted
    }
}

/// Fill in structured content from a successful result whose text is a JSON object.
fn with_structured_text(mut result: ToolResult) -> ToolResult {
    if result.is_error() || result.structured_content.is_some() {
        return result;
    }
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&result.as_text()) {
        result.structured_content = Some(value);
    }
    result
}

fn to_mcp_tool(tool: &ToolDefinition) -> McpTool {
    let input_schema = tool
        .input_schema()
        .and_then(|schema| schema.as_object().cloned())
        .unwrap_or_else(empty_object_schema);

    let mut mcp_tool = McpTool::new(
        tool.name().to_string(),
        tool.description().to_string(),
        Arc::new(input_schema),
    );
    mcp_tool.output_schema = tool
        .output_schema()
        .and_then(|schema| schema.as_object().cloned())
        .map(Arc::new);
    mcp_tool
}

fn empty_object_schema() -> JsonObject {
    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(JsonObject::new()));
    schema
}
