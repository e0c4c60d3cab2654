//! Bearer credential lifecycle for the downstream commerce API.
//!
//! - **[`CredentialStore`]**: the cached token and its expiry
//! - **[`TokenExchange`]**: one network token exchange (trait seam)
//! - **[`ClientCredentialsExchange`]**: the OAuth2 client-credentials grant
//! - **[`CredentialManager`]**: cached, single-flight access to a valid token
//!
//! The manager is built once at startup and shared behind an `Arc` with
//! everything that makes authenticated calls, usually through
//! [`crate::http::AuthenticatedClient`].

mod exchange;
mod manager;
mod store;

pub use exchange::{ClientCredentialsExchange, TokenExchange, TokenResponse, TOKEN_ENDPOINT_PATH};
pub use manager::{CredentialManager, DEFAULT_EXPIRY_MARGIN, MIN_EXPIRY_MARGIN};
pub use store::{Credential, CredentialStore};

use thiserror::Error;

/// Errors from a token exchange.
///
/// `Clone` because one failed refresh is delivered to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The token endpoint answered with a non-success status.
    #[error("token endpoint rejected the exchange ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint could not be reached.
    #[error("token exchange failed: {0}")]
    Network(String),

    /// The token endpoint answered with a body that is not a token response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}
