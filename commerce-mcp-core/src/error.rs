//! Top-level error types for commerce-mcp
//!
//! This module flattens the per-module errors into the categories a caller
//! of the server needs to act on.

use thiserror::Error;

use crate::config::ConfigError;
use crate::credential::CredentialError;
use crate::discovery::DiscoveryError;
use crate::http::HttpError;
use crate::registry::RegistryError;
use crate::session::SessionError;
use crate::tool::ToolError;

/// Top-level error type for commerce-mcp operations
///
/// - [`Error::Auth`] - Fix client credentials and restart
/// - [`Error::Config`] - Fix environment or flags
/// - [`Error::Discovery`] - Fix tool modules or manifests
/// - [`Error::Registration`] - Two tools share a name, or the transport refused one
/// - [`Error::Http`] - Downstream API failure
/// - [`Error::Tool`] - Tool execution failed
/// - [`Error::Session`] - The current user could not be resolved
/// - [`Error::Transport`] - The MCP connection failed
#[derive(Debug, Error)]
pub enum Error {
    /// Token exchange failed
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("discovery error: {0}")]
    Discovery(String),

    #[error("registration error: {0}")]
    Registration(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("MCP transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Returns true if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this error should abort startup
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::Config(_) | Self::Discovery(_) | Self::Registration(_)
        )
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CredentialError> for Error {
    fn from(err: CredentialError) -> Self {
        Self::Auth(err.to_string())
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Credential(e) => e.into(),
            other => Self::Http(other.to_string()),
        }
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Http(HttpError::Credential(e)) => e.into(),
            other => Self::Session(other.to_string()),
        }
    }
}

impl From<DiscoveryError> for Error {
    fn from(err: DiscoveryError) -> Self {
        Self::Discovery(err.to_string())
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Discovery(e) => e.into(),
            other => Self::Registration(other.to_string()),
        }
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

/// Result type for commerce-mcp operations
pub type Result<T> = std::result::Result<T, Error>;
