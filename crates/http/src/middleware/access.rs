//! Access gate middleware
//!
//! Runs in front of every route. Public paths and paths with dot segments
//! are decided without a session; for everything else the session is looked
//! up once. The [`AccessPolicy`] decides, and the request is either
//! forwarded or redirected with `307 Temporary Redirect`.
//!
//! [`AccessPolicy`]: crate::gate::AccessPolicy

use crate::config::GateConfig;
use crate::error::HttpError;
use crate::gate::GateDecision;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::HOST,
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use bezs_core::Session;

/// Header carrying the original absolute request URL to downstream code
pub const ORIGINAL_URL_HEADER: &str = "x-url";

const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// The absolute URL the browser asked for, attached to RBAC-checked requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUrl(pub String);

/// Middleware function for the access gate
pub async fn access_gate_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Never let a client supply its own annotation.
    req.headers_mut().remove(ORIGINAL_URL_HEADER);

    let path = req.uri().path().to_owned();

    let session = if state.policy.requires_session(&path) {
        load_session(&state, req.headers()).await
    } else {
        trace!(path = %path, "Skipping session lookup");
        None
    };

    match state.policy.decide(&path, session.as_ref()) {
        GateDecision::Redirect { category, location } => {
            info!(
                path = %path,
                category = %category,
                location = %location,
                authenticated = session.is_some(),
                "Request redirected by access gate"
            );
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Forward { category, annotate } => {
            debug!(path = %path, category = %category, "Request allowed by access gate");

            if annotate {
                let url = original_url(&state.gate, &req);
                match HeaderValue::from_str(&url) {
                    Ok(value) => {
                        req.headers_mut()
                            .insert(HeaderName::from_static(ORIGINAL_URL_HEADER), value);
                    }
                    Err(e) => warn!(path = %path, "Original URL is not a valid header: {e}"),
                }
                req.extensions_mut().insert(OriginalUrl(url));
            }

            if let Some(session) = session {
                req.extensions_mut().insert(session);
            }

            next.run(req).await
        }
    }
}

/// Fetch the session, treating failures and timeouts as signed out
async fn load_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let timeout = state.gate.session_timeout();

    match tokio::time::timeout(timeout, state.sessions.get_session(headers)).await {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!("Session lookup failed, treating request as signed out: {e}");
            None
        }
        Err(_) => {
            warn!(
                timeout_ms = state.gate.session_timeout_ms,
                "Session lookup timed out, treating request as signed out"
            );
            None
        }
    }
}

/// Rebuild the absolute URL of the request
fn original_url(config: &GateConfig, req: &Request) -> String {
    let uri = req.uri();
    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());

    if let Some(base) = &config.public_base_url {
        return format!("{}{path_and_query}", base.trim_end_matches('/'));
    }

    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }

    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    };
    let scheme = header(FORWARDED_PROTO_HEADER).unwrap_or("http");
    let host = header(HOST.as_str()).unwrap_or("localhost");

    format!("{scheme}://{host}{path_and_query}")
}

/// The session the gate attached to this request
///
/// Rejects with `401` when no session is present, which only happens on
/// routes the gate treats as public.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| HttpError::AuthenticationFailed("No session on request".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(HOST, "bezs.local:8080")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_original_url_from_host_header() {
        let url = original_url(&GateConfig::default(), &request("/bezs/filenest/docs?page=2"));
        assert_eq!(url, "http://bezs.local:8080/bezs/filenest/docs?page=2");
    }

    #[test]
    fn test_original_url_honors_forwarded_proto() {
        let mut req = request("/bezs/filenest/docs");
        req.headers_mut()
            .insert(FORWARDED_PROTO_HEADER, HeaderValue::from_static("https"));
        let url = original_url(&GateConfig::default(), &req);
        assert_eq!(url, "https://bezs.local:8080/bezs/filenest/docs");
    }

    #[test]
    fn test_original_url_prefers_public_base_url() {
        let config = GateConfig {
            public_base_url: Some("https://app.bezs.dev/".to_string()),
            ..GateConfig::default()
        };
        let url = original_url(&config, &request("/bezs/filenest/docs"));
        assert_eq!(url, "https://app.bezs.dev/bezs/filenest/docs");
    }
}
