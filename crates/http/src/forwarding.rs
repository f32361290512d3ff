//! Forwarding of gated requests to the upstream web application

use crate::config::UpstreamConfig;
use crate::error::HttpError;
use crate::state::AppState;
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, header},
    response::{IntoResponse, Response},
};
use bezs_core::access::has_dot_segment;
use std::time::Duration;
use tracing::Instrument;

/// Headers that describe a single connection and must not be relayed
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Reverse proxy to the upstream application
///
/// Redirects from upstream are passed to the browser untouched rather than
/// followed.
#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    base_url: String,
    max_body_bytes: usize,
}

impl UpstreamProxy {
    /// Build the proxy. Fails when no upstream base URL is configured.
    pub fn new(config: &UpstreamConfig) -> Result<Self, HttpError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| HttpError::InvalidConfig("upstream.base_url is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                HttpError::InternalServerError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Relay the request upstream and stream the answer back
    pub async fn forward(&self, req: Request) -> Result<Response, HttpError> {
        let (parts, body) = req.into_parts();

        if has_dot_segment(parts.uri.path()) {
            return Err(HttpError::BadRequest(format!(
                "Refusing to forward path with dot segments: {}",
                parts.uri.path()
            )));
        }

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        let url = format!("{}{path_and_query}", self.base_url);

        let body = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| HttpError::BadRequest(format!("Failed to read request body: {e}")))?;

        let mut outbound = self
            .client
            .request(parts.method.clone(), &url)
            .headers(forwardable_headers(&parts.headers))
            .body(body);

        if let Some(host) = parts.headers.get(header::HOST) {
            outbound = outbound.header("x-forwarded-host", host.clone());
        }

        let span = info_span!(
            "upstream_request",
            method = %parts.method,
            url = %url,
        );
        let upstream = outbound
            .send()
            .instrument(span)
            .await
            .map_err(|e| HttpError::BadGateway(format!("Failed to forward request: {e}")))?;

        let status = upstream.status();
        let headers = forwardable_headers(upstream.headers());
        debug!(status = status.as_u16(), "Upstream responded");

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response.headers_mut().remove(header::CONTENT_LENGTH);

        Ok(response)
    }
}

/// Copy headers, dropping connection-scoped ones and `host`
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) && name != header::HOST {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

/// Fallback handler: everything the gate let through that no local route
/// claims goes to the upstream application.
pub async fn forward_upstream(State(state): State<AppState>, req: Request) -> Response {
    match &state.upstream {
        Some(proxy) => proxy
            .forward(req)
            .await
            .unwrap_or_else(HttpError::into_response),
        None => HttpError::NotFound(req.uri().path().to_string()).into_response(),
    }
}
