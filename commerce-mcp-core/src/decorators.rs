//! Decorators over [`ToolDefinition`].
//!
//! A decorator is a pure function `ToolDefinition -> ToolDefinition`. It
//! takes the definition by value and returns one whose handler or access
//! predicate calls the previous one, so any clone taken before decoration is
//! unaffected.
//!
//! | Decorator | Wraps | Effect |
//! |-----------|-------|--------|
//! | [`with_error_handling`] | handler | failures and panics become `isError` results |
//! | [`requires_section`] | predicate | `existing AND session.has_capability(section)` |
//! | [`requires_admin`] | predicate | `existing AND session.is_privileged()` |
//! | [`with_validation`] | handler | validator runs before the body |
//!
//! Decorators apply in declared order, each wrapping the result of the
//! previous one. Error handling should be outermost so it observes both
//! validation and body failures:
//!
//! ```rust
//! use commerce_mcp_core::decorators::{compose, requires_section, with_error_handling, with_validation};
//! use commerce_mcp_core::{decorators, ToolDefinition, ToolResult};
//!
//! let pipeline = compose(decorators![
//!     requires_section("commerce"),
//!     with_validation(|args| match args.get("orderId") {
//!         Some(_) => Ok(()),
//!         None => Err("orderId is required".to_string()),
//!     }),
//!     with_error_handling,
//! ]);
//!
//! let tool = pipeline(ToolDefinition::new("get_order", "Fetch an order", |_, _| async {
//!     Ok(ToolResult::text("order"))
//! }));
//! assert!(tool.can_access().is_some());
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use serde_json::Value;
use tracing::warn;

use crate::session::Session;
use crate::tool::{ToolContext, ToolDefinition, ToolError, ToolFuture, ToolResult};

/// A boxed decorator, as collected by [`compose`].
pub type Decorator = Box<dyn Fn(ToolDefinition) -> ToolDefinition + Send + Sync>;

/// Contain every failure of the body as a structured error result.
///
/// Errors and panics raised by the wrapped handler are rendered as
/// `"Error using <name>: <message>"` with `isError: true`.
pub fn with_error_handling(definition: ToolDefinition) -> ToolDefinition {
    let inner = Arc::clone(definition.handler());
    let name: Arc<str> = Arc::from(definition.name());

    definition.with_erased_handler(Arc::new(move |args: Value, context: ToolContext| -> ToolFuture {
        let inner = Arc::clone(&inner);
        let name = Arc::clone(&name);
        async move {
            let outcome = AssertUnwindSafe(async move { inner(args, context).await })
                .catch_unwind()
                .await;

            let message = match outcome {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(err)) => err.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };

            warn!(tool = %name, error = %message, "tool call failed");
            Ok::<_, ToolError>(ToolResult::error_with(
                format!("Error using {}", name),
                &message,
            ))
        }
        .boxed()
    }))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}

/// Require the session to hold `section`, in addition to any existing predicate.
pub fn requires_section(
    section: impl Into<String>,
) -> impl Fn(ToolDefinition) -> ToolDefinition + Clone + Send + Sync + 'static {
    let section: Arc<str> = Arc::from(section.into());
    move |definition: ToolDefinition| {
        let section = Arc::clone(&section);
        require(definition, move |session| session.has_capability(&section))
    }
}

/// Require an administrator, in addition to any existing predicate.
pub fn requires_admin(definition: ToolDefinition) -> ToolDefinition {
    require(definition, Session::is_privileged)
}

fn require<F>(definition: ToolDefinition, check: F) -> ToolDefinition
where
    F: Fn(&Session) -> bool + Send + Sync + 'static,
{
    let existing = definition.can_access().cloned();
    definition.with_access(move |session| {
        existing.as_ref().map_or(true, |predicate| predicate(session)) && check(session)
    })
}

/// Run `validator` against the raw arguments before the body.
///
/// A rejection fails the call with [`ToolError::Validation`] carrying the
/// tool name and the validator's message; the body is not invoked.
pub fn with_validation<V>(
    validator: V,
) -> impl Fn(ToolDefinition) -> ToolDefinition + Clone + Send + Sync + 'static
where
    V: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
{
    let validator = Arc::new(validator);
    move |definition: ToolDefinition| {
        let validator = Arc::clone(&validator);
        let inner = Arc::clone(definition.handler());
        let name: Arc<str> = Arc::from(definition.name());

        definition.with_erased_handler(Arc::new(
            move |args: Value, context: ToolContext| -> ToolFuture {
                if let Err(message) = validator(&args) {
                    let err = ToolError::Validation {
                        tool: name.to_string(),
                        message,
                    };
                    return future::ready(Err(err)).boxed();
                }
                inner(args, context)
            },
        ))
    }
}

/// Chain decorators into one, applied first to last.
pub fn compose(
    decorators: Vec<Decorator>,
) -> impl Fn(ToolDefinition) -> ToolDefinition + Send + Sync + 'static {
    move |definition: ToolDefinition| {
        decorators
            .iter()
            .fold(definition, |decorated, decorator| decorator(decorated))
    }
}

/// Box heterogeneous decorators into a `Vec<Decorator>` for [`compose`].
#[macro_export]
macro_rules! decorators {
    ($($decorator:expr),* $(,)?) => {
        vec![$(Box::new($decorator) as $crate::decorators::Decorator),*]
    };
}
