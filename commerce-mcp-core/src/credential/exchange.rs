//! OAuth2 client-credentials token exchange.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::CredentialError;
use crate::config::ApiConfig;

/// Back-office token endpoint, relative to the Umbraco host.
pub const TOKEN_ENDPOINT_PATH: &str = "/umbraco/management/api/v1/security/back-office/token";

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the token in seconds.
    pub expires_in: i64,
}

/// Performs one network token exchange.
///
/// Implementations make exactly one request per call and do not retry;
/// caching and deduplication live in [`super::CredentialManager`].
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<TokenResponse, CredentialError>;
}

/// `grant_type=client_credentials` exchange against the back-office token endpoint.
pub struct ClientCredentialsExchange {
    client: reqwest::Client,
    endpoint: Url,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for ClientCredentialsExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsExchange")
            .field("endpoint", &self.endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientCredentialsExchange {
    /// Create an exchange for the configured host.
    pub fn new(client: reqwest::Client, config: &ApiConfig) -> Result<Self, url::ParseError> {
        Ok(Self::with_endpoint(
            client,
            config.endpoint(TOKEN_ENDPOINT_PATH)?,
            config.client_id(),
            config.client_secret(),
        ))
    }

    /// Create an exchange against an explicit token endpoint.
    pub fn with_endpoint(
        client: reqwest::Client,
        endpoint: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenExchange for ClientCredentialsExchange {
    async fn exchange(&self) -> Result<TokenResponse, CredentialError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| CredentialError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))
    }
}
