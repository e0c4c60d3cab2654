//! Shared request plumbing, response shapes and argument checks.

use commerce_mcp_core::{AuthenticatedClient, HttpError, STORE_HEADER};
use reqwest::{Method, RequestBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Root of the commerce management API.
pub const API_BASE: &str = "/umbraco/commerce/management/api/v1";

/// Back-office section every commerce tool requires.
pub const COMMERCE_SECTION: &str = "commerce";

/// Argument naming the store a call is scoped to.
pub const STORE_ARGUMENT: &str = "storeIdOrAlias";

pub fn api_path(path: &str) -> String {
    format!("{}{}", API_BASE, path)
}

/// Start a management API request scoped to a store through the store header.
pub fn store_request(
    client: &AuthenticatedClient,
    method: Method,
    path: &str,
    store: &str,
) -> Result<RequestBuilder, HttpError> {
    Ok(client.request(method, &api_path(path))?.header(STORE_HEADER, store))
}

/// `{ "success": bool }`, returned by operations that only acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Outcome {
    /// Whether the commerce API accepted the operation
    pub success: bool,
}

impl Outcome {
    /// A response body counts as acknowledgement when it is present.
    pub fn from_body(body: &Value) -> Self {
        Self {
            success: !body.is_null(),
        }
    }
}

/// A monetary value in a currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Price {
    pub value: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDto {
    #[serde(default)]
    pub code: Option<String>,
}

/// A price as the API reports it, with and without tax.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDto {
    #[serde(default)]
    pub without_tax: f64,
    #[serde(default)]
    pub with_tax: f64,
    #[serde(default)]
    pub currency: Option<CurrencyDto>,
}

impl From<&PriceDto> for Price {
    fn from(dto: &PriceDto) -> Self {
        Self {
            value: dto.with_tax,
            currency: dto
                .currency
                .as_ref()
                .and_then(|c| c.code.clone())
                .unwrap_or_default(),
        }
    }
}

/// A plain amount in a currency, as used by reporting endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmountDto {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub currency: Option<CurrencyDto>,
}

impl From<&AmountDto> for Price {
    fn from(dto: &AmountDto) -> Self {
        Self {
            value: dto.value,
            currency: dto
                .currency
                .as_ref()
                .and_then(|c| c.code.clone())
                .unwrap_or_default(),
        }
    }
}

/// Wrapper the API puts around calculated prices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalPriceDto {
    #[serde(default)]
    pub value: Option<PriceDto>,
}

// ==================== Argument checks ====================

/// The string argument `field`, or a message naming it.
pub fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, String> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{} is required", field))
}

/// Reject `field` unless it holds a UUID.
pub fn require_uuid(args: &Value, field: &str, message: &str) -> Result<(), String> {
    let value = required_str(args, field)?;
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| message.to_string())
}

/// Reject a store reference that is empty or could not be used as one path segment.
pub fn require_store(args: &Value) -> Result<(), String> {
    let store = required_str(args, STORE_ARGUMENT)?;
    if store.trim().is_empty() {
        return Err(format!("{} must not be empty", STORE_ARGUMENT));
    }
    if !store
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "{} may only contain letters, digits, '-' and '_'",
            STORE_ARGUMENT
        ));
    }
    Ok(())
}
