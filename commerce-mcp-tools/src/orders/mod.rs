//! Order tools
//!
//! ## Available Tools
//!
//! | Tool | Purpose | Access |
//! |------|---------|--------|
//! | `get_order_by_id` | Fetch one order as a summary | commerce |
//! | `capture_order_payment` | Capture an authorized payment | commerce |
//! | `cancel_order` | Cancel an order's payment with a reason | commerce |
//! | `refund_order_payment` | Refund all or part of a captured payment | commerce |

mod cancel_order_tool;
mod capture_order_payment_tool;
mod get_order_by_id_tool;
pub mod order;
mod refund_order_payment_tool;

pub use cancel_order_tool::{definition as cancel_order, CancelOrderInput, CancelOrderTool};
pub use capture_order_payment_tool::{
    definition as capture_order_payment, CaptureOrderPaymentInput, CaptureOrderPaymentTool,
};
pub use get_order_by_id_tool::{definition as get_order_by_id, GetOrderByIdInput, GetOrderByIdTool};
pub use order::{OrderDto, OrderSummary};
pub use refund_order_payment_tool::{
    definition as refund_order_payment, RefundOrderLine, RefundOrderPaymentInput,
    RefundOrderPaymentTool,
};

use crate::prelude::*;

pub fn all_tools(client: Arc<AuthenticatedClient>) -> Vec<ToolModule> {
    vec![
        get_order_by_id_tool::module(Arc::clone(&client)),
        capture_order_payment_tool::module(Arc::clone(&client)),
        cancel_order_tool::module(Arc::clone(&client)),
        refund_order_payment_tool::module(client),
    ]
}
