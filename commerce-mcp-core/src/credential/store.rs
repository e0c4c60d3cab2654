//! Cached credential state.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A bearer token together with the instant it stops being usable.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Build a credential from a token endpoint lifetime.
    ///
    /// `expires_at = now + expires_in - margin`. A lifetime shorter than the
    /// margin yields a credential that is already expired.
    pub fn from_lifetime(
        token: impl Into<String>,
        expires_in_secs: i64,
        margin: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let margin_secs = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);
        let usable = expires_in_secs.saturating_sub(margin_secs);
        let expires_at = now
            .checked_add_signed(chrono::Duration::seconds(usable))
            .unwrap_or(now);
        Self::new(token, expires_at)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds at most one cached credential.
///
/// This is plain state; synchronization is the caller's concern.
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: Option<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if one exists and has not expired at `now`.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|credential| credential.is_valid_at(now))
            .map(Credential::token)
    }

    pub fn store(&mut self, credential: Credential) {
        self.current = Some(credential);
    }

    /// Drop the cached credential, returning it if there was one.
    pub fn invalidate(&mut self) -> Option<Credential> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Credential> {
        self.current.as_ref()
    }
}
