//! The resolved back-office session.
//!
//! A [`Session`] is resolved once per process, before tools are registered,
//! and is shared read-only with every tool afterwards. Access checks are a
//! single membership query, [`Session::has_capability`], over the sections
//! granted to the user; anything richer is composed outside the session as
//! an access predicate (see [`crate::decorators`]).

mod service;

pub use service::{SessionResolver, SessionService, CURRENT_USER_PATH};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpError;

/// Errors raised while resolving or checking a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("user does not have access to section: {0}")]
    MissingCapability(String),

    #[error("failed to resolve session: {0}")]
    Http(#[from] HttpError),
}

/// The user a session belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub has_access_to_sensitive_data: bool,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// A user together with the capabilities (sections) granted to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: UserIdentity,
    granted_sections: BTreeSet<String>,
}

impl Session {
    pub fn new<I, S>(user: UserIdentity, granted_sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user,
            granted_sections: granted_sections.into_iter().map(Into::into).collect(),
        }
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// Whether the session holds the named capability.
    pub fn has_capability(&self, name: &str) -> bool {
        self.granted_sections.contains(name)
    }

    /// Whether the user is an administrator.
    pub fn is_privileged(&self) -> bool {
        self.user.is_admin
    }

    /// Fail with [`SessionError::MissingCapability`] unless the capability is held.
    pub fn require_capability(&self, name: &str) -> Result<(), SessionError> {
        if self.has_capability(name) {
            Ok(())
        } else {
            Err(SessionError::MissingCapability(name.to_string()))
        }
    }

    pub fn granted_sections(&self) -> impl Iterator<Item = &str> {
        self.granted_sections.iter().map(String::as_str)
    }
}
