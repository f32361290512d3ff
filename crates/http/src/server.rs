//! Router composition
//!
//! Layers wrap from the outside in: request tracing, correlation IDs, then
//! the access gate, so every log line the gate writes carries the
//! correlation ID and nothing reaches a handler or the upstream proxy
//! without passing the gate.

use crate::forwarding::forward_upstream;
use crate::middleware::{access_gate_middleware, correlation_id_middleware};
use crate::routes;
use crate::state::AppState;
use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::trace::TraceLayer;

/// Path the OpenAPI description is served from
pub const OPENAPI_PATH: &str = "/openapi.json";

/// Build the complete axum router for the gate
pub fn build_router(state: AppState) -> Router {
    let (router, api) = routes::router().split_for_parts();

    router
        .route(
            OPENAPI_PATH,
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .fallback(forward_upstream)
        .layer(from_fn_with_state(state.clone(), access_gate_middleware))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
