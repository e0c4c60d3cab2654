//! Session-filtered tool registration.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::decorators::with_error_handling;
use crate::discovery::{DiscoveryError, ToolDiscovery};
use crate::session::Session;
use crate::tool::ToolDefinition;

/// Errors raised while installing tools.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("transport rejected tool {name}: {reason}")]
    Transport { name: String, reason: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Where registered tools are installed.
pub trait ToolTransport {
    /// Install a tool under its declared name, description and schemas.
    fn install(&mut self, tool: ToolDefinition) -> Result<(), RegistryError>;
}

/// Parameters for one registration pass. Not retained after the pass.
pub struct ToolRegistrationContext<'a, T: ToolTransport + ?Sized> {
    pub transport: &'a mut T,
    pub session: Arc<Session>,
}

impl<'a, T: ToolTransport + ?Sized> ToolRegistrationContext<'a, T> {
    pub fn new(transport: &'a mut T, session: Arc<Session>) -> Self {
        Self { transport, session }
    }
}

/// What a registration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub installed: Vec<String>,
    pub denied: Vec<String>,
}

/// Install every tool the session may use.
///
/// Tools whose access predicate rejects the session are skipped. Each
/// survivor is wrapped with [`with_error_handling`] before installation so
/// that no tool body can fail a transport request. Duplicate names among
/// the survivors fail the pass before anything is installed.
pub fn register_tools<T, I>(
    context: ToolRegistrationContext<'_, T>,
    tools: I,
) -> Result<RegistrationSummary, RegistryError>
where
    T: ToolTransport + ?Sized,
    I: IntoIterator<Item = ToolDefinition>,
{
    let mut summary = RegistrationSummary::default();
    let mut allowed = Vec::new();
    let mut names = HashSet::new();

    for tool in tools {
        if !tool.is_accessible_by(&context.session) {
            debug!(tool = %tool.name(), "session may not use tool, skipping");
            summary.denied.push(tool.name().to_string());
            continue;
        }
        if !names.insert(tool.name().to_string()) {
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }
        allowed.push(tool);
    }

    for tool in allowed {
        let name = tool.name().to_string();
        context.transport.install(with_error_handling(tool))?;
        summary.installed.push(name);
    }

    info!(
        user = %context.session.user().name,
        installed = summary.installed.len(),
        denied = summary.denied.len(),
        "registered tools"
    );
    Ok(summary)
}

/// Run discovery, then register the result for the context's session.
pub async fn discover_and_register<T>(
    context: ToolRegistrationContext<'_, T>,
    discovery: ToolDiscovery,
) -> Result<RegistrationSummary, RegistryError>
where
    T: ToolTransport + ?Sized,
{
    let report = discovery.run().await?;
    register_tools(context, report.tools)
}
