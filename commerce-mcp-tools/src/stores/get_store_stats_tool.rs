use crate::common::{api_path, require_store, AmountDto, Price, COMMERCE_SECTION};
use crate::prelude::*;
use chrono::NaiveDate;
use commerce_mcp_core::{requires_section, with_validation};
use serde_json::Value;

/// Format of the `date` argument.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input for store statistics
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetStoreStatsInput {
    /// The store's unique ID or alias
    pub store_id_or_alias: String,

    /// Date for which to retrieve the stats data. Format: yyyy-MM-dd
    pub date: String,

    /// Timezone offset in minutes for the local timezone. Used to adjust date calculations
    pub local_timezone_offset: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatsDto {
    #[serde(default)]
    pub all_time_total_revenue: AmountDto,
    #[serde(default)]
    pub all_time_total_orders: u64,
    #[serde(default)]
    pub total_revenue: AmountDto,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_new_orders: u64,
    #[serde(default)]
    pub total_authorized_orders: u64,
    #[serde(default)]
    pub total_captured_orders: u64,
    #[serde(default)]
    pub total_refunded_orders: u64,
    #[serde(default)]
    pub total_errored_orders: u64,
}

/// A store's performance for one day, with all-time totals
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub all_time_total_revenue: Price,
    pub all_time_total_orders: u64,
    pub total_revenue: Price,
    pub total_orders: u64,
    pub total_new_orders: u64,
    pub total_authorized_orders: u64,
    pub total_captured_orders: u64,
    pub total_refunded_orders: u64,
    pub total_errored_orders: u64,
}

impl From<StoreStatsDto> for StoreStats {
    fn from(dto: StoreStatsDto) -> Self {
        Self {
            all_time_total_revenue: Price::from(&dto.all_time_total_revenue),
            all_time_total_orders: dto.all_time_total_orders,
            total_revenue: Price::from(&dto.total_revenue),
            total_orders: dto.total_orders,
            total_new_orders: dto.total_new_orders,
            total_authorized_orders: dto.total_authorized_orders,
            total_captured_orders: dto.total_captured_orders,
            total_refunded_orders: dto.total_refunded_orders,
            total_errored_orders: dto.total_errored_orders,
        }
    }
}

/// Tool for retrieving store statistics
pub struct GetStoreStatsTool {
    client: Arc<AuthenticatedClient>,
}

impl GetStoreStatsTool {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

impl Tool for GetStoreStatsTool {
    type Input = GetStoreStatsInput;

    fn name(&self) -> &str {
        "get_store_stats"
    }

    fn description(&self) -> &str {
        "Retrieve the stats information for a specific store. This tool provides an overview of \
         the store's performance, including total revenue and order counts by payment state. The \
         store is identified by its unique ID or alias.\n\n\
         - Authorized orders require payment capturing.\n\
         - Captured orders have payment completed and are ready for fulfillment.\n\
         - Errored orders indicate issues with payment processing."
    }

    fn output_schema(&self) -> Option<Value> {
        Some(commerce_mcp_core::schema_for::<StoreStats>())
    }

    fn execute(
        &self,
        input: Self::Input,
        _context: ToolContext,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let store = input.store_id_or_alias;
            let path = api_path(&format!("/store/{}/stats", store));
            let offset = input.local_timezone_offset.to_string();
            let request = client.get(&path)?.query(&[
                ("date", input.date.as_str()),
                ("localTimezoneOffset", offset.as_str()),
            ]);

            let stats: Option<StoreStatsDto> = client.send_json(request).await?;
            let stats = stats.ok_or_else(|| {
                ToolError::from(format!("Store with ID or alias \"{}\" not found.", store))
            })?;

            Ok(ToolResult::json(&StoreStats::from(stats))?)
        }
    }
}

/// Reject a `date` that is not a calendar day in `yyyy-MM-dd` form.
pub fn validate_date(args: &Value) -> Result<(), String> {
    let date = args
        .get("date")
        .and_then(Value::as_str)
        .ok_or("date is required")?;
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| format!("Invalid date \"{}\", expected yyyy-MM-dd", date))
}

pub fn definition(client: Arc<AuthenticatedClient>) -> ToolDefinition {
    ToolDefinition::from_tool(GetStoreStatsTool::new(client))
        .decorate(requires_section(COMMERCE_SECTION))
        .decorate(with_validation(|args: &Value| {
            require_store(args)?;
            validate_date(args)
        }))
}

pub(crate) fn module(client: Arc<AuthenticatedClient>) -> ToolModule {
    ToolModule::new(module_path!(), definition(client))
}
