//! Order status tools
//!
//! ## Available Tools
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `get_order_statuses` | List the statuses orders in a store can take |

mod get_order_statuses_tool;

pub use get_order_statuses_tool::{
    definition as get_order_statuses, GetOrderStatusesInput, GetOrderStatusesTool, OrderStatus,
    OrderStatusDto,
};

use crate::prelude::*;

pub fn all_tools(client: Arc<AuthenticatedClient>) -> Vec<ToolModule> {
    vec![get_order_statuses_tool::module(client)]
}
