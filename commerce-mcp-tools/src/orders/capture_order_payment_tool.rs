use crate::common::{require_store, require_uuid, store_request, Outcome, COMMERCE_SECTION};
use crate::prelude::*;
use commerce_mcp_core::{requires_section, with_validation};
use reqwest::Method;
use serde_json::Value;
use tracing::info;

/// Input for capturing an authorized payment
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderPaymentInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,

    /// The unique identifier of the order to capture
    pub order_id: String,
}

/// Tool for capturing the payment of an authorized order
pub struct CaptureOrderPaymentTool {
    client: Arc<AuthenticatedClient>,
}

impl CaptureOrderPaymentTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for CaptureOrderPaymentTool {
    type Input = CaptureOrderPaymentInput;

    fn name(&self) -> &str {
        "capture_order_payment"
    }

    fn description(&self) -> &str {
        "Capture a payment for an existing order. This tool allows you to capture the payment for \
         an order identified by its unique ID. The order ID must be a valid UUID. The store is \
         identified by its unique ID or alias. This operation is typically used after an order \
         has been authorized but not yet captured."
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
            let path = format!("/order/{}/capture-payment", input.order_id);
            let request = store_request(&client, Method::POST, &path, &input.store_id_or_alias)?;
            let body: Value = client.send_json(request).await?;

            let outcome = Outcome::from_body(&body);
            info!(order = %input.order_id, success = outcome.success, "captured order payment");
            Ok(ToolResult::json(&outcome)?)
        }
    }
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(CaptureOrderPaymentTool::new(client))
        .decorate(requires_section(COMMERCE_SECTION))
        .decorate(with_validation(|args: &Value| {
            require_store(args)?;
            require_uuid(args, "orderId", "Invalid order ID format")
        }))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{call, commerce_api, ORDER_ID};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn capture_path() -> String {
        format!(
            "/umbraco/commerce/management/api/v1/order/{}/capture-payment",
            ORDER_ID
        )
    }

    fn args() -> Value {
        json!({"storeIdOrAlias": "blendid", "orderId": ORDER_ID})
    }

    #[tokio::test]
    async fn test_capture_reports_success() {
        let (server, client) = commerce_api().await;

        Mock::given(method("POST"))
            .and(path(capture_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": ORDER_ID})))
            .expect(1)
            .mount(&server)
            .await;

        let result = call(&definition(client), args()).await;
        let outcome: Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(outcome, json!({"success": true}));
        assert_eq!(result.structured_content, Some(outcome));
    }

    #[tokio::test]
    async fn test_empty_body_is_not_success() {
        let (server, client) = commerce_api().await;

        Mock::given(method("POST"))
            .and(path(capture_path()))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = call(&definition(client), args()).await;
        assert!(!result.is_error());
        let outcome: Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(outcome, json!({"success": false}));
    }

    #[tokio::test]
    async fn test_api_rejection_is_contained() {
        let (server, client) = commerce_api().await;

        Mock::given(method("POST"))
            .and(path(capture_path()))
            .respond_with(ResponseTemplate::new(409).set_body_string("payment already captured"))
            .mount(&server)
            .await;

        let result = call(&definition(client), args()).await;
        assert!(result.is_error());
        assert_eq!(
            result.as_text(),
            "Error using capture_order_payment: downstream API returned 409: payment already captured"
        );
    }

    #[tokio::test]
    async fn test_output_schema_is_outcome() {
        let (_server, client) = commerce_api().await;
        let definition = definition(client);

        let schema = definition.output_schema().unwrap();
        assert_eq!(schema["properties"]["success"]["type"], "boolean");
    }
}
