//! Session lookups against the authentication service

use crate::config::SessionClientConfig;
use crate::error::HttpError;
use async_trait::async_trait;
use axum::http::{
    HeaderMap, HeaderValue, StatusCode,
    header::{AUTHORIZATION, CACHE_CONTROL, COOKIE},
};
use bezs_core::access::RawSession;
use bezs_core::{Session, SessionError, SessionProvider};
use std::time::Duration;

/// Session provider backed by the auth service's introspection endpoint
///
/// The caller's `cookie` and `authorization` headers are relayed as-is and
/// every lookup bypasses caches, so a role change is visible on the very
/// next request.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSessionProvider {
    pub fn new(config: &SessionClientConfig, timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                HttpError::InternalServerError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        for name in [COOKIE, AUTHORIZATION] {
            for value in headers.get_all(&name) {
                request = request.header(name.clone(), value.clone());
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout
            } else {
                SessionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::Status(status.as_u16()));
        }

        let raw: Option<RawSession> = response
            .json()
            .await
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        let session = raw.map(Session::try_from).transpose()?;
        trace!(authenticated = session.is_some(), "Session lookup completed");
        Ok(session)
    }
}
