use crate::common::{require_store, require_uuid, store_request, Outcome, COMMERCE_SECTION};
use crate::prelude::*;
use commerce_mcp_core::{requires_section, with_validation};
use reqwest::Method;
use serde_json::Value;
use tracing::info;

/// One order line to refund
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefundOrderLine {
    /// The unique identifier of the order line to refund
    pub order_line_id: String,

    /// The number of items to refund from the order line
    pub quantity: u32,
}

/// Input for refunding a captured payment
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefundOrderPaymentInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,

    /// The unique identifier of the order to refund
    pub order_id: String,

    /// The total amount to refund for the order. Must be positive
    pub amount: f64,

    /// Order lines to refund (default: the whole order)
    #[serde(default)]
    pub order_lines: Option<Vec<RefundOrderLine>>,

    /// Whether to restock products after refunding (default: false)
    #[serde(default)]
    pub restock_products: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundRequest<'a> {
    refund_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_lines: Option<&'a [RefundOrderLine]>,
    restock_products: bool,
}

/// Tool for refunding an order's captured payment
pub struct RefundOrderPaymentTool {
    client: Arc<AuthenticatedClient>,
}

impl RefundOrderPaymentTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for RefundOrderPaymentTool {
    type Input = RefundOrderPaymentInput;

    fn name(&self) -> &str {
        "refund_order_payment"
    }

    fn description(&self) -> &str {
        "Refund a payment for an existing order. This tool allows you to refund the payment for an \
         order identified by its unique ID. The order ID must be a valid UUID. The store is \
         identified by its unique ID or alias. This operation is typically used to process refunds \
         after an order has been captured."
    }

    fn output_schema(&self) -> Option<Value> {
        Some(commerce_mcp_core::schema_for::<Outcome>())
    }

    fn execute(
        &self,
        input: Self::Input,
        _context: ToolContext,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let path = format!("/order/{}/refund-payment", input.order_id);
            let payload = RefundRequest {
                refund_amount: input.amount,
                order_lines: input.order_lines.as_deref(),
                restock_products: input.restock_products,
            };
            let request = store_request(&client, Method::POST, &path, &input.store_id_or_alias)?
                .json(&payload);
            let body: Value = client.send_json(request).await?;

            let outcome = Outcome::from_body(&body);
            info!(
                order = %input.order_id,
                amount = input.amount,
                success = outcome.success,
                "refunded order payment"
            );
            Ok(ToolResult::json(&outcome)?)
        }
    }
}

/// Reject a non-positive amount or a malformed order line.
pub fn validate_refund(args: &Value) -> Result<(), String> {
    let amount = args
        .get("amount")
        .and_then(Value::as_f64)
        .ok_or("amount is required")?;
    if amount <= 0.0 {
        return Err("Refund amount must be a positive number".to_string());
    }

    let lines = args
        .get("orderLines")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for line in lines {
        require_uuid(line, "orderLineId", "Invalid order line ID format")?;
        if line.get("quantity").and_then(Value::as_u64).unwrap_or(0) == 0 {
            return Err("Order line quantity must be a positive integer".to_string());
        }
    }
    Ok(())
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(RefundOrderPaymentTool::new(client))
        .decorate(requires_section(COMMERCE_SECTION))
        .decorate(with_validation(|args: &Value| {
            require_store(args)?;
            require_uuid(args, "orderId", "Invalid order ID format")?;
            validate_refund(args)
        }))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}
