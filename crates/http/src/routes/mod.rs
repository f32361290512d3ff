//! API route definitions
use crate::state::AppState;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

pub mod health;
pub mod rbac;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bezs access gate",
        description = "Session-aware RBAC gate in front of the Bezs web application"
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "rbac", description = "Role, menu and action resolution for the signed-in user"),
    ),
)]
struct ApiDoc;

/// All local routes, with their OpenAPI description
pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(health::health_check))
        .merge(rbac::router())
}
