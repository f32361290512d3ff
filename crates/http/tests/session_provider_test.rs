//! Tests for the HTTP session provider against a mock auth service

use axum::http::{HeaderMap, HeaderValue, header};
use bezs_core::{SessionError, SessionProvider};
use bezs_http::HttpSessionProvider;
use bezs_http::config::SessionClientConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PATH: &str = "/api/auth/get-session";

fn provider(server: &MockServer, timeout: Duration) -> HttpSessionProvider {
    let config = SessionClientConfig {
        base_url: server.uri(),
        session_path: SESSION_PATH.to_string(),
    };
    HttpSessionProvider::new(&config, timeout).unwrap()
}

fn cookie_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("bezs.session_token=abc"),
    );
    headers
}

#[tokio::test]
async fn test_session_is_fetched_with_caller_cookie_and_no_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .and(header_eq("cookie", "bezs.session_token=abc"))
        .and(header_eq("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "name": "Ada", "role": "editor" },
            "grants": [{
                "organizationId": "org1",
                "roleId": "r1",
                "roleName": "editor",
                "organizationApps": ["app1"],
                "roleMenuPermissions": [{
                    "appId": "app1",
                    "appSlug": "/bezs/filenest",
                    "menuItem": {
                        "name": "Docs",
                        "slug": "/bezs/filenest/docs",
                        "icon": "file",
                        "description": "Documents"
                    }
                }],
                "roleActionPermissions": [{
                    "appId": "app1",
                    "appSlug": "/bezs/filenest",
                    "menuItemSlug": "/bezs/filenest/docs",
                    "action": "upload"
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider(&server, Duration::from_secs(5))
        .get_session(&cookie_headers())
        .await
        .unwrap()
        .expect("session should be present");

    assert_eq!(session.user.id, "u1");
    assert_eq!(session.active_role(), "editor");
    assert_eq!(session.grants.len(), 1);
    assert_eq!(session.grants[0].menu_permissions.len(), 1);
    assert_eq!(session.grants[0].action_permissions[0].action, "upload");
}

#[tokio::test]
async fn test_bearer_token_is_relayed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .and(header_eq("authorization", "Bearer t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": "u1", "role": "editor" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t1"));

    let session = provider(&server, Duration::from_secs(5))
        .get_session(&headers)
        .await
        .unwrap();
    assert!(session.is_some());
}

#[tokio::test]
async fn test_null_body_means_signed_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    let session = provider(&server, Duration::from_secs(5))
        .get_session(&HeaderMap::new())
        .await
        .unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_mean_signed_out() {
    for status in [401, 403] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SESSION_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let session = provider(&server, Duration::from_secs(5))
            .get_session(&cookie_headers())
            .await
            .unwrap();
        assert!(session.is_none(), "status {status}");
    }
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = provider(&server, Duration::from_secs(5))
        .get_session(&cookie_headers())
        .await;
    assert_eq!(result.unwrap_err(), SessionError::Status(503));
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = provider(&server, Duration::from_secs(5))
        .get_session(&cookie_headers())
        .await;
    assert!(matches!(result, Err(SessionError::Malformed(_))));
}

#[tokio::test]
async fn test_session_without_user_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "grants": [] })))
        .mount(&server)
        .await;

    let result = provider(&server, Duration::from_secs(5))
        .get_session(&cookie_headers())
        .await;
    assert!(matches!(result, Err(SessionError::Malformed(_))));
}

#[tokio::test]
async fn test_slow_auth_service_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": "u1", "role": "editor" } }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let result = provider(&server, Duration::from_millis(100))
        .get_session(&cookie_headers())
        .await;
    assert_eq!(result.unwrap_err(), SessionError::Timeout);
}

#[tokio::test]
async fn test_unreachable_auth_service_is_transport_error() {
    let config = SessionClientConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        session_path: SESSION_PATH.to_string(),
    };
    let provider = HttpSessionProvider::new(&config, Duration::from_secs(2)).unwrap();

    let result = provider.get_session(&HeaderMap::new()).await;
    assert!(matches!(
        result,
        Err(SessionError::Transport(_) | SessionError::Timeout)
    ));
}
