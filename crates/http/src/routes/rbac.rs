//! RBAC views for downstream page code
//!
//! These handlers sit behind the access gate, which has already attached
//! the session. Everything is resolved from that session on each call.

use crate::error::HttpError;
use crate::middleware::CurrentSession;
use crate::state::AppState;
use axum::{
    extract::{Path, Query},
    response::Json,
};
use bezs_core::access::{
    initial_landing_page, resolve_app_actions, resolve_app_menu_items, resolve_role_route_map,
};
use bezs_core::listing::{GrantSummary, ListQuery};
use bezs_core::{MenuItem, SessionUser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Routes visible to each role the user holds
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleRoutesResponse {
    pub user: SessionUser,
    pub active_role: String,
    /// Role name to route patterns
    pub roles: BTreeMap<String, Vec<String>>,
}

/// Menu of one application
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppMenuResponse {
    pub app: String,
    pub items: Vec<MenuItem>,
    /// Slug of the page the application opens on
    pub landing: Option<String>,
}

/// Actions enabled in one application
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppActionsResponse {
    pub app: String,
    pub actions: Vec<String>,
}

/// The user's grants, summarized
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantListResponse {
    pub sort: String,
    pub order: String,
    pub grants: Vec<GrantSummary>,
}

/// Listing parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GrantListParams {
    /// One of `organizationId`, `roleName`, `appCount`, `menuCount`
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
    /// `organizationId:<value>` or `roleName:<value>`
    pub filter: Option<String>,
}

/// Role-route map of the current user
#[utoipa::path(
    get,
    path = "/bezs/api/rbac/routes",
    responses(
        (status = 200, description = "Routes per role", body = RoleRoutesResponse),
        (status = 307, description = "Not signed in")
    ),
    tag = "rbac"
)]
pub async fn role_routes(CurrentSession(session): CurrentSession) -> Json<RoleRoutesResponse> {
    let roles = resolve_role_route_map(&session.grants)
        .into_inner()
        .into_iter()
        .map(|(role, routes)| (role, routes.into_iter().collect()))
        .collect();

    Json(RoleRoutesResponse {
        active_role: session.active_role().to_string(),
        user: session.user,
        roles,
    })
}

/// Menu entries the user may see in one application
#[utoipa::path(
    get,
    path = "/bezs/api/rbac/menu/{app}",
    params(("app" = String, Path, description = "Application short name, e.g. `filenest`")),
    responses(
        (status = 200, description = "Menu of the application", body = AppMenuResponse)
    ),
    tag = "rbac"
)]
pub async fn app_menu(
    CurrentSession(session): CurrentSession,
    Path(app): Path<String>,
) -> Json<AppMenuResponse> {
    let items = resolve_app_menu_items(&session.grants, &app);
    let landing = initial_landing_page(&items).map(|item| item.slug.clone());

    Json(AppMenuResponse {
        app,
        items,
        landing,
    })
}

/// Actions the user may perform in one application
#[utoipa::path(
    get,
    path = "/bezs/api/rbac/actions/{app}",
    params(("app" = String, Path, description = "Application short name, e.g. `filenest`")),
    responses(
        (status = 200, description = "Enabled actions", body = AppActionsResponse)
    ),
    tag = "rbac"
)]
pub async fn app_actions(
    CurrentSession(session): CurrentSession,
    Path(app): Path<String>,
) -> Json<AppActionsResponse> {
    let actions = resolve_app_actions(&session.grants, &app)
        .into_iter()
        .collect();

    Json(AppActionsResponse { app, actions })
}

/// The user's grants, sorted and filtered by allow-listed fields
#[utoipa::path(
    get,
    path = "/bezs/api/rbac/grants",
    params(GrantListParams),
    responses(
        (status = 200, description = "Grant summaries", body = GrantListResponse),
        (status = 400, description = "Unknown sort or filter field", body = crate::error::ErrorResponse)
    ),
    tag = "rbac"
)]
pub async fn list_grants(
    CurrentSession(session): CurrentSession,
    Query(params): Query<GrantListParams>,
) -> Result<Json<GrantListResponse>, HttpError> {
    let query = ListQuery::parse(
        params.sort.as_deref(),
        params.order.as_deref(),
        params.filter.as_deref(),
    )?;

    let grants = query.apply(&session.grants);
    debug!(count = grants.len(), "Listed grants");

    Ok(Json(GrantListResponse {
        sort: query.sort.as_str().to_string(),
        order: query.order.to_string(),
        grants,
    }))
}

/// Router for the RBAC endpoints
pub fn router() -> utoipa_axum::router::OpenApiRouter<AppState> {
    use utoipa_axum::{router::OpenApiRouter, routes};

    OpenApiRouter::new()
        .routes(routes!(role_routes))
        .routes(routes!(app_menu))
        .routes(routes!(app_actions))
        .routes(routes!(list_grants))
}
