//! Commerce back-office tools for the commerce MCP server.
//!
//! Every tool lives in a `*_tool` module and exports a ready-to-register
//! [`ToolDefinition`](commerce_mcp_core::ToolDefinition) through its
//! `definition` function. [`catalog`] wraps all of them as
//! [`ToolModule`]s so they go through the same discovery checks as
//! manifest tools.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use commerce_mcp_core::{AuthenticatedClient, ToolDiscovery};
//! # async fn run(client: Arc<AuthenticatedClient>) -> commerce_mcp_core::Result<()> {
//! let report = ToolDiscovery::new()
//!     .with_modules(commerce_mcp_tools::catalog(Arc::clone(&client)))
//!     .run()
//!     .await?;
//! assert!(report.names().contains(&"get_order_by_id"));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use commerce_mcp_core::{AuthenticatedClient, ToolModule};

pub mod common;
pub mod order_statuses;
pub mod orders;
pub mod stores;

#[cfg(test)]
pub(crate) mod test_support;

/// Every compiled tool, one module per tool.
pub fn catalog(client: Arc<AuthenticatedClient>) -> Vec<ToolModule> {
    let mut modules = Vec::new();
    modules.extend(order_statuses::all_tools(Arc::clone(&client)));
    modules.extend(orders::all_tools(Arc::clone(&client)));
    modules.extend(stores::all_tools(client));
    modules
}

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use std::future::Future;
    pub use std::sync::Arc;

    pub use commerce_mcp_core::{
        AuthenticatedClient, Tool, ToolContext, ToolDefinition, ToolError, ToolModule, ToolResult,
    };
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
}
