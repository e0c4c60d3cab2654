//! # commerce-mcp-core
//!
//! Building blocks for an MCP server that exposes commerce back-office
//! operations to agents.
//!
//! The crate covers two concerns:
//!
//! - **Credentials**: [`CredentialManager`] keeps one OAuth2
//!   client-credentials bearer token fresh, with at most one refresh in
//!   flight. [`AuthenticatedClient`] attaches it to every downstream call and
//!   replays a call once after a `401`.
//! - **Tools**: a [`ToolDefinition`] describes one operation. The
//!   [`decorators`] add error containment, access requirements and argument
//!   validation; [`discovery`] collects definitions from compiled modules and
//!   `*.tool.json` manifests; [`registry`] installs the ones the current
//!   [`Session`] may use into a [`ToolTransport`] such as [`McpToolServer`].
//!
//! ## Startup
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commerce_mcp_core::{
//!     register_tools, ApiConfig, AuthenticatedClient, ClientCredentialsExchange,
//!     CredentialManager, McpToolServer, SessionResolver, SessionService, ToolDiscovery,
//!     ToolRegistrationContext,
//! };
//!
//! # async fn run() -> commerce_mcp_core::Result<()> {
//! let config = ApiConfig::from_env()?;
//! let http = reqwest::Client::new();
//! let exchange = ClientCredentialsExchange::new(http.clone(), &config)
//!     .map_err(|e| commerce_mcp_core::Error::Config(e.to_string()))?;
//! let credentials = Arc::new(CredentialManager::new(exchange));
//! let client = Arc::new(AuthenticatedClient::for_config(http, &config, credentials));
//!
//! let session = Arc::new(SessionService::new(Arc::clone(&client)).resolve().await?);
//! let report = ToolDiscovery::new()
//!     .with_manifest_dir("./tools", Arc::clone(&client))
//!     .run()
//!     .await?;
//!
//! let mut server = McpToolServer::new("commerce-mcp", "0.1.0", Arc::clone(&session));
//! register_tools(ToolRegistrationContext::new(&mut server, session), report.tools)?;
//! server.serve_stdio().await
//! # }
//! ```
//!
//! ## Tokens
//!
//! ```rust
//! use async_trait::async_trait;
//! use commerce_mcp_core::{CredentialError, CredentialManager, TokenExchange, TokenResponse};
//!
//! struct Static;
//!
//! #[async_trait]
//! impl TokenExchange for Static {
//!     async fn exchange(&self) -> Result<TokenResponse, CredentialError> {
//!         Ok(TokenResponse {
//!             access_token: "abc".into(),
//!             token_type: Some("Bearer".into()),
//!             expires_in: 3600,
//!         })
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let manager = CredentialManager::new(Static);
//! assert_eq!(manager.get_token().await.unwrap(), "abc");
//! # });
//! ```

pub mod config;
pub mod credential;
pub mod decorators;
pub mod discovery;
pub mod error;
pub mod http;
pub mod registry;
pub mod server;
pub mod session;
pub mod tool;

pub use config::{ApiConfig, ConfigError, BASE_URL_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
pub use credential::{
    ClientCredentialsExchange, Credential, CredentialError, CredentialManager, CredentialStore,
    TokenExchange, TokenResponse, DEFAULT_EXPIRY_MARGIN, MIN_EXPIRY_MARGIN, TOKEN_ENDPOINT_PATH,
};
pub use decorators::{
    compose, requires_admin, requires_section, with_error_handling, with_validation, Decorator,
};
pub use discovery::{
    discover, is_tool_module, DiscoveryError, DiscoveryReport, RejectedModule, ShapeViolation,
    ToolDiscovery, ToolExport, ToolModule,
};
pub use error::{Error, Result};
pub use http::{AuthenticatedClient, HttpError, STORE_HEADER};
pub use registry::{
    discover_and_register, register_tools, RegistrationSummary, RegistryError,
    ToolRegistrationContext, ToolTransport,
};
pub use server::McpToolServer;
pub use session::{Session, SessionError, SessionResolver, SessionService, UserIdentity};
pub use tool::{
    schema_for, AccessPredicate, Tool, ToolContent, ToolContext, ToolDefinition, ToolError,
    ToolFuture, ToolHandler, ToolResult,
};
