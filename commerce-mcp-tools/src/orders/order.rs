//! Order shapes shared by the order tools.

use crate::common::{Price, TotalPriceDto};
use crate::prelude::*;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfoDto {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub customer_reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusRefDto {
    #[serde(default)]
    pub alias: Option<String>,
}

/// An order as the commerce API returns it. Unused fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_info: Option<CustomerInfoDto>,
    #[serde(default)]
    pub order_status: Option<OrderStatusRefDto>,
    #[serde(default)]
    pub total_price: Option<TotalPriceDto>,
    #[serde(default)]
    pub finalized_date: Option<String>,
    #[serde(default)]
    pub order_lines: Vec<Value>,
}

/// The customer an order belongs to
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub customer_reference: Option<String>,
}

/// Condensed view of an order for agents
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub order_number: String,
    pub customer: OrderCustomer,
    /// Alias of the order's current status
    pub status: String,
    pub total_price: Option<Price>,
    pub finalized_date: Option<String>,
    pub order_line_count: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<OrderDto> for OrderSummary {
    fn from(order: OrderDto) -> Self {
        let customer = order.customer_info.unwrap_or_default();
        Self {
            id: order.id,
            order_number: non_empty(order.order_number).unwrap_or_else(|| "N/A".to_string()),
            customer: OrderCustomer {
                first_name: non_empty(customer.first_name),
                last_name: non_empty(customer.last_name),
                email: non_empty(customer.email),
                customer_reference: non_empty(customer.customer_reference),
            },
            status: order
                .order_status
                .and_then(|status| non_empty(status.alias))
                .unwrap_or_else(|| "unknown".to_string()),
            total_price: order
                .total_price
                .and_then(|total| total.value)
                .map(|price| Price::from(&price)),
            finalized_date: order.finalized_date,
            order_line_count: order.order_lines.len(),
        }
    }
}
