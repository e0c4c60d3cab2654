//! Downstream API configuration.
//!
//! The server needs three values before it can talk to the commerce API:
//! the base URL of the Umbraco installation and an OAuth2 client id/secret
//! pair registered for the back-office API user. All three are validated here,
//! before any network activity happens.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Environment variable holding the Umbraco base URL.
pub const BASE_URL_ENV: &str = "UMBRACO_BASE_URL";

/// Environment variable holding the OAuth2 client id.
pub const CLIENT_ID_ENV: &str = "UMBRACO_CLIENT_ID";

/// Environment variable holding the OAuth2 client secret.
pub const CLIENT_SECRET_ENV: &str = "UMBRACO_CLIENT_SECRET";

/// Errors raised while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required value was not provided.
    #[error("{0} is required")]
    Missing(&'static str),

    /// The base URL could not be parsed.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    /// The base URL uses a scheme other than http or https.
    #[error("base URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
}

/// Validated connection settings for the downstream API.
#[derive(Clone)]
pub struct ApiConfig {
    host: Url,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Validate and build a configuration.
    pub fn new(
        host: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::Missing(BASE_URL_ENV));
        }

        let parsed = Url::parse(host).map_err(|e| ConfigError::InvalidUrl {
            value: host.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(ConfigError::Missing(CLIENT_ID_ENV));
        }

        let client_secret = client_secret.into();
        if client_secret.trim().is_empty() {
            return Err(ConfigError::Missing(CLIENT_SECRET_ENV));
        }

        Ok(Self {
            host: parsed,
            client_id,
            client_secret,
        })
    }

    /// Build a configuration from the `UMBRACO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var(BASE_URL_ENV).map_err(|_| ConfigError::Missing(BASE_URL_ENV))?;
        let client_id =
            std::env::var(CLIENT_ID_ENV).map_err(|_| ConfigError::Missing(CLIENT_ID_ENV))?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV)
            .map_err(|_| ConfigError::Missing(CLIENT_SECRET_ENV))?;
        Self::new(&host, client_id, client_secret)
    }

    /// The base URL of the Umbraco installation.
    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Resolve an absolute API path against the host.
    ///
    /// The path is appended to the host (keeping any path prefix the host
    /// carries) rather than replacing it.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        join_path(&self.host, path)
    }
}

pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{}/{}", base, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ApiConfig::new("https://shop.example.com", "id", "secret").unwrap();
        assert_eq!(config.host().as_str(), "https://shop.example.com/");
        assert_eq!(config.client_id(), "id");
        assert_eq!(config.client_secret(), "secret");
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(
            ApiConfig::new("", "id", "secret").unwrap_err(),
            ConfigError::Missing(BASE_URL_ENV)
        );
        assert_eq!(
            ApiConfig::new("https://shop.example.com", " ", "secret").unwrap_err(),
            ConfigError::Missing(CLIENT_ID_ENV)
        );
        assert_eq!(
            ApiConfig::new("https://shop.example.com", "id", "").unwrap_err(),
            ConfigError::Missing(CLIENT_SECRET_ENV)
        );
    }

    #[test]
    fn test_malformed_url() {
        let err = ApiConfig::new("not a url", "id", "secret").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = ApiConfig::new("ftp://shop.example.com", "id", "secret").unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedScheme("ftp".to_string()));
    }

    #[test]
    fn test_endpoint_keeps_host_prefix() {
        let config = ApiConfig::new("https://example.com/shop/", "id", "secret").unwrap();
        let url = config.endpoint("/umbraco/api/token").unwrap();
        assert_eq!(url.as_str(), "https://example.com/shop/umbraco/api/token");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ApiConfig::new("https://shop.example.com", "id", "hunter2").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
