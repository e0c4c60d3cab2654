use crate::common::{require_store, require_uuid, required_str, store_request, COMMERCE_SECTION};
use crate::prelude::*;
use chrono::Utc;
use commerce_mcp_core::{compose, decorators, requires_section, with_validation};
use reqwest::Method;
use serde_json::Value;
use tracing::info;

/// Longest cancellation reason accepted, in characters.
pub const MAX_REASON_LENGTH: usize = 500;

/// Input for cancelling an order
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,

    /// The unique identifier of the order to cancel
    pub order_id: String,

    /// Why the order is being cancelled (1-500 characters)
    pub reason: String,
}

/// Record of a cancellation, returned alongside the confirmation text
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Cancellation<'a> {
    id: &'a str,
    status: &'static str,
    cancellation_reason: &'a str,
    cancelled_at: String,
    cancelled_by: &'a str,
}

/// Tool for cancelling an order's payment with a recorded reason
pub struct CancelOrderTool {
    client: Arc<AuthenticatedClient>,
}

impl CancelOrderTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for CancelOrderTool {
    type Input = CancelOrderInput;

    fn name(&self) -> &str {
        "cancel_order"
    }

    fn description(&self) -> &str {
        "Cancel an order with a reason. The order's payment is cancelled in the store identified \
         by its unique ID or alias. The order ID must be a valid UUID."
    }

    fn execute(
        &self,
        input: Self::Input,
        context: ToolContext,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let path = format!("/order/{}/cancel-payment", input.order_id);
            let request = store_request(&client, Method::POST, &path, &input.store_id_or_alias)?;
            let body: Value = client.send_json(request).await?;
            if body.is_null() {
                return Err(ToolError::from(format!(
                    "Order {} could not be cancelled.",
                    input.order_id
                )));
            }

            let cancelled_by = context.session().user().name.as_str();
            let record = Cancellation {
                id: &input.order_id,
                status: "Cancelled",
                cancellation_reason: &input.reason,
                cancelled_at: Utc::now().to_rfc3339(),
                cancelled_by,
            };
            info!(order = %input.order_id, by = %cancelled_by, "cancelled order");

            Ok(ToolResult::text(format!(
                "Order {} has been cancelled successfully.\n\n{}",
                input.order_id,
                serde_json::to_string_pretty(&record)?
            )))
        }
    }
}

/// Reject an empty or overlong cancellation reason.
pub fn validate_reason(args: &Value) -> Result<(), String> {
    let reason = required_str(args, "reason").map_err(|_| "Cancellation reason is required")?;
    match reason.chars().count() {
        0 => Err("Cancellation reason is required".to_string()),
        n if n > MAX_REASON_LENGTH => Err("Reason too long".to_string()),
        _ => Ok(()),
    }
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(CancelOrderTool::new(client)).decorate(compose(decorators![
        requires_section(COMMERCE_SECTION),
        with_validation(|args: &Value| {
            require_store(args)?;
            require_uuid(args, "orderId", "Invalid order ID format")?;
            validate_reason(args)
        }),
    ]))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}
