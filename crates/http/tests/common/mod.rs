//! Shared fixtures for the HTTP integration tests

#![allow(dead_code)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use bezs_core::access::{ActionPermission, StaticSessionProvider};
use bezs_core::{GrantRecord, MenuItem, MenuPermission, Session, SessionUser};

pub const EDITOR_TOKEN: &str = "editor-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// An editor in org1, which has enabled filenest (app1) only
pub fn editor_session() -> Session {
    let grant = GrantRecord::new("org1", "editor")
        .with_role_id("r1")
        .with_app("app1")
        .with_menu_permission(MenuPermission::new(
            "app1",
            "/bezs/filenest",
            MenuItem::new("Documents", "/bezs/filenest/docs").with_icon("file"),
        ))
        .with_menu_permission(MenuPermission::new(
            "app1",
            "/bezs/filenest",
            MenuItem::new("Images", "/bezs/filenest/images").with_icon("image"),
        ))
        .with_menu_permission(MenuPermission::new(
            "app2",
            "/bezs/telemedicine",
            MenuItem::new("Rooms", "/bezs/telemedicine/rooms").with_icon("video"),
        ))
        .with_action_permission(ActionPermission::new(
            "app1",
            "/bezs/filenest",
            "/bezs/filenest/docs",
            "upload",
        ));

    Session::new(SessionUser::new("u1", "editor"), vec![grant])
}

pub fn admin_session() -> Session {
    Session::new(SessionUser::new("u0", "admin"), vec![])
}

pub fn static_sessions() -> StaticSessionProvider {
    StaticSessionProvider::new()
        .with_session(EDITOR_TOKEN, editor_session())
        .with_session(ADMIN_TOKEN, admin_session())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "bezs.local")
        .body(Body::empty())
        .unwrap()
}

pub fn get_as(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "bezs.local")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
