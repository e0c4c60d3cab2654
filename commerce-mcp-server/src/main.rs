//! Stdio MCP server for commerce back-office operations.
//!
//! Startup exchanges the client credentials for a token, resolves the API
//! user's session, discovers the compiled catalog plus any manifest tools,
//! installs the ones the session may use and then serves MCP on
//! stdin/stdout. Logs go to stderr so they never mix with the protocol.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use commerce_mcp_core::{
    register_tools, ApiConfig, AuthenticatedClient, ClientCredentialsExchange, CredentialManager,
    McpToolServer, SessionResolver, SessionService, ToolDiscovery, ToolRegistrationContext,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SERVER_NAME: &str = "commerce-mcp";

const INSTRUCTIONS: &str = "Tools operate on a commerce store identified by its ID or alias. \
     Use get_order_statuses to learn a store's statuses before acting on orders.";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = ApiConfig::new(
        &cli.base_url,
        cli.client_id.as_str(),
        cli.client_secret.as_str(),
    )?;
    info!(host = %config.host(), "starting {}", SERVER_NAME);

    let http = reqwest::Client::builder()
        .timeout(cli.http_timeout())
        .build()
        .context("failed to build HTTP client")?;
    let exchange = ClientCredentialsExchange::new(http.clone(), &config)
        .context("invalid token endpoint")?;
    let credentials = Arc::new(CredentialManager::new(exchange).with_margin(cli.token_margin()));
    let client = Arc::new(AuthenticatedClient::for_config(http, &config, credentials));

    let session = SessionService::new(Arc::clone(&client))
        .resolve()
        .await
        .map_err(commerce_mcp_core::Error::from)?;
    let session = Arc::new(session);
    info!(user = %session.user().name, "resolved session");

    let mut discovery =
        ToolDiscovery::new().with_modules(commerce_mcp_tools::catalog(Arc::clone(&client)));
    if let Some(dir) = &cli.tools_dir {
        discovery = discovery.with_manifest_dir(dir, Arc::clone(&client));
    }
    let report = discovery.run().await.map_err(commerce_mcp_core::Error::from)?;
    if !report.rejected.is_empty() {
        warn!(
            rejected = report.rejected.len(),
            "some tool modules were skipped"
        );
    }

    let mut server =
        McpToolServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION"), Arc::clone(&session))
            .with_instructions(INSTRUCTIONS);
    let summary = register_tools(ToolRegistrationContext::new(&mut server, session), report.tools)
        .map_err(commerce_mcp_core::Error::from)?;
    info!(
        installed = summary.installed.len(),
        denied = summary.denied.len(),
        "tools registered"
    );

    server.serve_stdio().await?;
    Ok(())
}
