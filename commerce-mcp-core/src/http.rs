//! Authenticated HTTP client for the downstream commerce API.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::config::{join_path, ApiConfig};
use crate::credential::{CredentialError, CredentialManager};

/// Header selecting the store for store-scoped endpoints.
pub const STORE_HEADER: &str = "store";

/// Errors from an authenticated downstream call.
#[derive(Debug, Error)]
pub enum HttpError {
    /// No token could be obtained.
    #[error("authentication failed: {0}")]
    Credential(#[from] CredentialError),

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The downstream API answered with a non-success status.
    #[error("downstream API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

impl HttpError {
    /// Returns true if the downstream API rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// HTTP client that attaches a bearer token to every call.
///
/// Each logical call is dispatched with the token from
/// [`CredentialManager::get_token`]. If the response is `401 Unauthorized`
/// the client forces a refresh and replays a copy of the original request
/// exactly once; a second `401` is returned to the caller as-is. Requests
/// whose body cannot be copied (streams) are sent once without replay.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<CredentialManager>,
}

impl AuthenticatedClient {
    pub fn new(client: reqwest::Client, base_url: Url, credentials: Arc<CredentialManager>) -> Self {
        Self {
            client,
            base_url,
            credentials,
        }
    }

    /// Create a client rooted at the configured host.
    pub fn for_config(
        client: reqwest::Client,
        config: &ApiConfig,
        credentials: Arc<CredentialManager>,
    ) -> Self {
        Self::new(client, config.host().clone(), credentials)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Resolve an API path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, HttpError> {
        Ok(join_path(&self.base_url, path)?)
    }

    /// Start a request for an API path. Send it with [`Self::send`] or [`Self::send_json`].
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, HttpError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder, HttpError> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> Result<RequestBuilder, HttpError> {
        self.request(Method::POST, path)
    }

    /// Build and send a request, returning the raw response.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, HttpError> {
        let request = builder.build()?;
        self.execute(request).await
    }

    /// Send a request and decode a successful JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, HttpError> {
        let response = self.send(builder).await?;
        decode_json(response).await
    }

    /// Execute a request with bearer authentication and one replay on `401`.
    pub async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let mut replay = request.try_clone();
        let mut attempt = request;
        let mut rejected: Option<String> = None;

        loop {
            let token = match &rejected {
                Some(stale) => self.credentials.refresh_if_current(stale).await?,
                None => self.credentials.get_token().await?,
            };
            set_bearer(&mut attempt, &token)?;

            let response = self.client.execute(attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED || rejected.is_some() {
                return Ok(response);
            }

            match replay.take() {
                Some(next) => {
                    warn!(url = %response.url(), "bearer token rejected, refreshing and replaying once");
                    attempt = next;
                    rejected = Some(token);
                }
                None => return Ok(response),
            }
        }
    }
}

fn set_bearer(request: &mut Request, token: &str) -> Result<(), HttpError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// Convert a response into `T`, mapping non-success statuses to [`HttpError::Status`].
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, HttpError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HttpError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(body).map_err(|e| HttpError::Decode(e.to_string()))
}
