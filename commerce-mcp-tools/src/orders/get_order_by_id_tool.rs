use super::order::{OrderDto, OrderSummary};
use crate::common::{require_store, require_uuid, store_request, COMMERCE_SECTION};
use crate::prelude::*;
use commerce_mcp_core::{compose, decorators, requires_section, with_validation, HttpError};
use reqwest::Method;
use serde_json::Value;

/// Input for fetching a single order
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderByIdInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,

    /// The unique identifier of the order to retrieve
    pub order_id: String,
}

/// Tool for fetching an order by its ID
pub struct GetOrderByIdTool {
    client: Arc<AuthenticatedClient>,
}

impl GetOrderByIdTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for GetOrderByIdTool {
    type Input = GetOrderByIdInput;

    fn name(&self) -> &str {
        "get_order_by_id"
    }

    fn description(&self) -> &str {
        "Retrieve an order by its unique identifier. The order ID must be a valid UUID. \
         The store is identified by its unique ID or alias."
    }

    fn output_schema(&self) -> Option<Value> {
        Some(commerce_mcp_core::schema_for::<OrderSummary>())
    }

    fn execute(
        &self,
        input: Self::Input,
        _context: ToolContext,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let path = format!("/order/{}", input.order_id);
            let request = store_request(&client, Method::GET, &path, &input.store_id_or_alias)?;

            let order: Option<OrderDto> = match client.send_json(request).await {
                Err(HttpError::Status { status: 404, .. }) => None,
                other => other?,
            };
            let order = order.ok_or_else(|| {
                ToolError::from(format!("Order with ID \"{}\" not found.", input.order_id))
            })?;

            Ok(ToolResult::json(&OrderSummary::from(order))?)
        }
    }
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(GetOrderByIdTool::new(client)).decorate(compose(decorators![
        requires_section(COMMERCE_SECTION),
        with_validation(|args: &Value| {
            require_store(args)?;
            require_uuid(args, "orderId", "Invalid order ID format")
        }),
    ]))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}
