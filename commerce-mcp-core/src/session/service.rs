use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{Session, SessionError, UserIdentity};
use crate::http::AuthenticatedClient;

/// Current back-office user endpoint, relative to the Umbraco host.
pub const CURRENT_USER_PATH: &str = "/umbraco/management/api/v1/user/current";

/// Produces the session used for access filtering.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self) -> Result<Session, SessionError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserResponse {
    #[serde(flatten)]
    user: UserIdentity,
    #[serde(default)]
    allowed_sections: Vec<String>,
}

/// Resolves the session from the API user the server authenticates as.
pub struct SessionService {
    client: Arc<AuthenticatedClient>,
}

impl SessionService {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionResolver for SessionService {
    async fn resolve(&self) -> Result<Session, SessionError> {
        let request = self.client.get(CURRENT_USER_PATH)?;
        let current: CurrentUserResponse = self.client.send_json(request).await?;

        info!(
            user = %current.user.name,
            sections = current.allowed_sections.len(),
            admin = current.user.is_admin,
            "resolved session"
        );
        Ok(Session::new(current.user, current.allowed_sections))
    }
}
