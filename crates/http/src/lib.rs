//! Bezs HTTP layer: the access gate and the routes behind it
//!
//! The gate runs as axum middleware in front of every request. It looks up
//! the caller's session, applies the route table and RBAC rules, and either
//! forwards the request (to a local route or the upstream web application)
//! or redirects the browser.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod forwarding;
pub mod gate;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use error::{HttpError, Result};
pub use forwarding::UpstreamProxy;
pub use gate::{AccessPolicy, GateDecision, RouteCategory};
pub use server::build_router;
pub use services::HttpSessionProvider;
pub use state::AppState;

// Re-export commonly used types
pub use axum::{Json, extract, response};
