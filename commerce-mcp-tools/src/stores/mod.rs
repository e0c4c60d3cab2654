//! Store tools
//!
//! ## Available Tools
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `get_store_stats` | Revenue and order counts for a store on a given day |

mod get_store_stats_tool;

pub use get_store_stats_tool::{
    definition as get_store_stats, GetStoreStatsInput, GetStoreStatsTool, StoreStats,
    StoreStatsDto,
};

use crate::prelude::*;

pub fn all_tools(client: Arc<AuthenticatedClient>) -> Vec<ToolModule> {
    vec![get_store_stats_tool::module(client)]
}
