use crate::common::{require_store, store_request, COMMERCE_SECTION};
use crate::prelude::*;
use commerce_mcp_core::{requires_section, with_validation};
use reqwest::Method;
use tracing::debug;

/// Input for listing order statuses
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderStatusesInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusDto {
    pub id: String,
    pub alias: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// An order status as reported to the agent
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct OrderStatus {
    pub id: String,
    /// The unique alias of the order status
    pub alias: String,
    /// The name of the order status
    pub name: String,
    /// The color associated with the order status, used for UI representation
    pub color: Option<String>,
}

impl From<OrderStatusDto> for OrderStatus {
    fn from(dto: OrderStatusDto) -> Self {
        Self {
            id: dto.id,
            alias: dto.alias,
            name: dto.name,
            color: dto.color.filter(|c| !c.is_empty()),
        }
    }
}

/// Tool for listing a store's order statuses
pub struct GetOrderStatusesTool {
    client: Arc<AuthenticatedClient>,
}

impl GetOrderStatusesTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for GetOrderStatusesTool {
    type Input = GetOrderStatusesInput;

    fn name(&self) -> &str {
        "get_order_statuses"
    }

    fn description(&self) -> &str {
        "Retrieve the list of order statuses for a specific store. This tool provides the available \
         statuses that can be assigned to orders in the store, such as \"New\", \"Completed\", \
         \"Captured\", etc. The store is identified by its unique ID or alias."
    }

    fn execute(
        &self,
        input: Self::Input,
        _context: ToolContext,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let store = input.store_id_or_alias;
            let request = store_request(&client, Method::GET, "/order-status", &store)?;
            let statuses: Option<Vec<OrderStatusDto>> = client.send_json(request).await?;

            let statuses = statuses.ok_or_else(|| {
                ToolError::from(format!(
                    "No order statuses found for store with ID or alias \"{}\".",
                    store
                ))
            })?;
            debug!(store = %store, count = statuses.len(), "fetched order statuses");

            let statuses: Vec<OrderStatus> = statuses.into_iter().map(OrderStatus::from).collect();
            Ok(ToolResult::json(&statuses)?)
        }
    }
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(GetOrderStatusesTool::new(client))
        .decorate(requires_section(COMMERCE_SECTION))
        .decorate(with_validation(require_store))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}
