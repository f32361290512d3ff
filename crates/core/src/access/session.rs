//! Sessions and the session provider seam

use super::grants::{GrantRecord, RawGrant};
use async_trait::async_trait;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Why a session could not be obtained
///
/// Every variant is handled by the access gate the same way as "no
/// session": the request is treated as unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session provider unreachable: {0}")]
    Transport(String),

    #[error("Session provider returned status {0}")]
    Status(u16),

    #[error("Session provider timed out")]
    Timeout,

    #[error("Malformed session payload: {0}")]
    Malformed(String),
}

/// The authenticated user behind a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    /// The role the user is currently acting as
    pub role: String,
}

/// A validated session: the user plus every grant they hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub grants: Vec<GrantRecord>,
}

impl Session {
    pub fn new(user: SessionUser, grants: Vec<GrantRecord>) -> Self {
        Self { user, grants }
    }

    /// Name of the role the user is acting as
    pub fn active_role(&self) -> &str {
        &self.user.role
    }
}

impl SessionUser {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role: role.into(),
        }
    }
}

/// Wire shape of the session user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSessionUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Wire shape of a session as returned by the session endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSession {
    pub user: Option<RawSessionUser>,
    pub grants: Option<Vec<RawGrant>>,
}

impl TryFrom<RawSession> for Session {
    type Error = SessionError;

    /// A session without a user id is unusable. Malformed grants are
    /// dropped individually; the rest of the session stays valid.
    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        let raw_user = raw
            .user
            .ok_or_else(|| SessionError::Malformed("missing user".to_string()))?;
        let id = raw_user
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SessionError::Malformed("missing user id".to_string()))?;

        let user = SessionUser {
            id,
            name: raw_user.name,
            role: raw_user.role.unwrap_or_default(),
        };

        let mut grants = Vec::new();
        for raw_grant in raw.grants.unwrap_or_default() {
            match GrantRecord::try_from(raw_grant) {
                Ok(grant) => grants.push(grant),
                Err(e) => warn!(user_id = %user.id, "Dropping malformed grant: {e}"),
            }
        }

        Ok(Self { user, grants })
    }
}

/// Source of the current session for a request
///
/// Implementations must not cache: role changes made in the admin console
/// take effect on the next request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Look up the session for the request carrying these headers.
    ///
    /// `Ok(None)` means the caller is not signed in.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Serves fixed sessions keyed by token
///
/// The token is read from a `Bearer` authorization header or from the
/// configured session cookie. Useful for local development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    cookie_name: String,
    sessions: HashMap<String, Session>,
}

impl StaticSessionProvider {
    pub const DEFAULT_COOKIE: &'static str = "bezs.session_token";

    pub fn new() -> Self {
        Self {
            cookie_name: Self::DEFAULT_COOKIE.to_string(),
            sessions: HashMap::new(),
        }
    }

    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn with_session(mut self, token: impl Into<String>, session: Session) -> Self {
        self.sessions.insert(token.into(), session);
        self
    }

    fn token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if let Some(token) = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
        {
            return Some(token.trim());
        }

        headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        Ok(self
            .token(headers)
            .and_then(|token| self.sessions.get(token))
            .cloned())
    }
}

#[cfg(any(test, feature = "tests"))]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub SessionProvider {}

        #[async_trait]
        impl SessionProvider for SessionProvider {
            async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
        }
    }
}
