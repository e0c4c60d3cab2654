//! Single-flight bearer token cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::exchange::TokenExchange;
use super::store::{Credential, CredentialStore};
use super::CredentialError;

/// Smallest safety margin subtracted from a token's reported lifetime.
pub const MIN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Default safety margin subtracted from a token's reported lifetime.
pub const DEFAULT_EXPIRY_MARGIN: Duration = MIN_EXPIRY_MARGIN;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, CredentialError>>>;

#[derive(Default)]
struct State {
    store: CredentialStore,
    pending: Option<RefreshFuture>,
}

/// Produces a currently valid bearer token on demand.
///
/// The manager owns the cached [`Credential`] and the in-flight refresh, if
/// any. All reads and writes of both go through one lock, and at most one
/// token exchange is in flight at any instant: callers that need a token
/// while a refresh is pending await the same shared outcome, so one expiry
/// event always resolves to one token (or one failure) for every waiter.
///
/// The pending marker is cleared by the refresh itself, after the exchange
/// settles and before the shared output is handed to any waiter. A failed
/// exchange leaves the cache empty, so the next caller starts a new one.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use commerce_mcp_core::config::ApiConfig;
/// use commerce_mcp_core::credential::{ClientCredentialsExchange, CredentialManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ApiConfig::new("https://shop.example.com", "client", "secret")?;
/// let exchange = ClientCredentialsExchange::new(reqwest::Client::new(), &config)?;
/// let credentials = Arc::new(CredentialManager::new(exchange));
///
/// let token = credentials.get_token().await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
pub struct CredentialManager {
    exchange: Arc<dyn TokenExchange>,
    margin: Duration,
    state: Arc<Mutex<State>>,
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CredentialManager")
            .field("margin", &self.margin)
            .field("cached", &state.store.current())
            .field("refreshing", &state.pending.is_some())
            .finish()
    }
}

impl CredentialManager {
    pub fn new(exchange: impl TokenExchange + 'static) -> Self {
        Self::from_arc(Arc::new(exchange))
    }

    pub fn from_arc(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            margin: DEFAULT_EXPIRY_MARGIN,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Set the expiry safety margin. Values below [`MIN_EXPIRY_MARGIN`] are raised to it.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin.max(MIN_EXPIRY_MARGIN);
        self
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Return the cached token if it is still valid, otherwise start or join a refresh.
    pub async fn get_token(&self) -> Result<String, CredentialError> {
        let refresh = {
            let mut state = self.state.lock();
            if let Some(token) = state.store.valid_token(Utc::now()) {
                return Ok(token.to_string());
            }
            self.pending_or_start(&mut state)
        };
        refresh.await
    }

    /// Invalidate the cache and obtain a token from a new exchange.
    ///
    /// A refresh that is already in flight was started after the cache was
    /// last found invalid, so it is joined instead of starting a second one.
    pub async fn force_refresh(&self) -> Result<String, CredentialError> {
        let refresh = {
            let mut state = self.state.lock();
            state.store.invalidate();
            self.pending_or_start(&mut state)
        };
        refresh.await
    }

    /// Obtain a replacement for a token the API rejected.
    ///
    /// Only a `rejected` token that is still the cached one is invalidated.
    /// When the cache already holds a different valid token, another caller
    /// has refreshed since `rejected` was handed out and that token is
    /// returned. A pending refresh is joined.
    pub async fn refresh_if_current(&self, rejected: &str) -> Result<String, CredentialError> {
        let refresh = {
            let mut state = self.state.lock();
            if state.pending.is_none() {
                let current = state.store.valid_token(Utc::now()).map(str::to_string);
                match current {
                    Some(token) if token != rejected => {
                        debug!("rejected token already replaced");
                        return Ok(token);
                    }
                    _ => {
                        state.store.invalidate();
                    }
                }
            }
            self.pending_or_start(&mut state)
        };
        refresh.await
    }

    /// Whether a token exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    fn pending_or_start(&self, state: &mut State) -> RefreshFuture {
        if let Some(pending) = &state.pending {
            debug!("joining in-flight token refresh");
            return pending.clone();
        }

        let exchange = Arc::clone(&self.exchange);
        let shared_state = Arc::clone(&self.state);
        let margin = self.margin;

        let refresh = async move {
            debug!("requesting access token");
            let outcome = exchange.exchange().await;

            let mut state = shared_state.lock();
            state.pending = None;
            match outcome {
                Ok(response) => {
                    let credential = Credential::from_lifetime(
                        response.access_token,
                        response.expires_in,
                        margin,
                        Utc::now(),
                    );
                    debug!(expires_at = %credential.expires_at(), "access token refreshed");
                    let token = credential.token().to_string();
                    state.store.store(credential);
                    Ok(token)
                }
                Err(err) => {
                    warn!(error = %err, "access token exchange failed");
                    Err(err)
                }
            }
        }
        .boxed()
        .shared();

        state.pending = Some(refresh.clone());
        refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::TokenResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts exchanges and replays a scripted sequence of outcomes.
    struct ScriptedExchange {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        expires_in: i64,
        failures: Mutex<VecDeque<CredentialError>>,
    }

    impl ScriptedExchange {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                delay: Duration::from_millis(0),
                expires_in: 3600,
                failures: Mutex::new(VecDeque::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn with_expires_in(mut self, expires_in: i64) -> Self {
            self.expires_in = expires_in;
            self
        }

        fn failing_once(self, error: CredentialError) -> Self {
            self.failures.lock().push_back(error);
            self
        }
    }

    #[async_trait]
    impl TokenExchange for ScriptedExchange {
        async fn exchange(&self) -> Result<TokenResponse, CredentialError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if let Some(err) = self.failures.lock().pop_front() {
                return Err(err);
            }
            Ok(TokenResponse {
                access_token: format!("token-{}", n),
                token_type: Some("Bearer".to_string()),
                expires_in: self.expires_in,
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = Arc::new(CredentialManager::new(
            ScriptedExchange::new(Arc::clone(&calls)).with_delay(Duration::from_millis(50)),
        ));

        let tasks = (0..16).map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_token().await })
        });
        let results = futures::future::join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().unwrap(), "token-1");
        }
        assert!(!manager.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rejected = CredentialError::Rejected {
            status: 401,
            body: "invalid_client".to_string(),
        };
        let manager = CredentialManager::new(
            ScriptedExchange::new(Arc::clone(&calls))
                .with_delay(Duration::from_millis(20))
                .failing_once(rejected.clone()),
        );

        let results = futures::future::join_all((0..8).map(|_| manager.get_token())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap_err(), rejected);
        }

        // The failure is not cached: the next caller retries the exchange.
        assert_eq!(manager.get_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_valid_cache_makes_no_network_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(ScriptedExchange::new(Arc::clone(&calls)));

        assert_eq!(manager.get_token().await.unwrap(), "token-1");
        assert_eq!(manager.get_token().await.unwrap(), "token-1");
        assert_eq!(manager.get_token().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_valid_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(ScriptedExchange::new(Arc::clone(&calls)));

        assert_eq!(manager.get_token().await.unwrap(), "token-1");
        assert_eq!(manager.force_refresh().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The refreshed token is what later callers see.
        assert_eq!(manager.get_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_force_refreshes_share_one_exchange() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(
            ScriptedExchange::new(Arc::clone(&calls)).with_delay(Duration::from_millis(30)),
        );
        manager.get_token().await.unwrap();

        let results = futures::future::join_all((0..4).map(|_| manager.force_refresh())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        for result in results {
            assert_eq!(result.unwrap(), "token-2");
        }
    }

    #[tokio::test]
    async fn test_refresh_if_current_keeps_a_newer_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(ScriptedExchange::new(Arc::clone(&calls)));

        let stale = manager.get_token().await.unwrap();
        assert_eq!(manager.refresh_if_current(&stale).await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // A second rejection of the same stale token must not refresh again.
        assert_eq!(manager.refresh_if_current(&stale).await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Rejecting the current token does.
        assert_eq!(manager.refresh_if_current("token-2").await.unwrap(), "token-3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refresh_if_current_joins_pending_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(
            ScriptedExchange::new(Arc::clone(&calls)).with_delay(Duration::from_millis(30)),
        );
        let stale = manager.get_token().await.unwrap();

        let (first, second) = tokio::join!(
            manager.refresh_if_current(&stale),
            manager.refresh_if_current(&stale)
        );

        assert_eq!(first.unwrap(), "token-2");
        assert_eq!(second.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lifetime_within_margin_is_never_cached_as_valid() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager =
            CredentialManager::new(ScriptedExchange::new(Arc::clone(&calls)).with_expires_in(30));

        assert_eq!(manager.get_token().await.unwrap(), "token-1");
        assert_eq!(manager.get_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_margin_is_clamped_to_minimum() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = CredentialManager::new(ScriptedExchange::new(Arc::clone(&calls)))
            .with_margin(Duration::from_secs(5));
        assert_eq!(manager.margin(), MIN_EXPIRY_MARGIN);

        let manager = CredentialManager::new(ScriptedExchange::new(calls))
            .with_margin(Duration::from_secs(120));
        assert_eq!(manager.margin(), Duration::from_secs(120));
    }
}
