//! The access gate's decision logic
//!
//! [`AccessPolicy::decide`] is a pure function of the request path and the
//! session. The middleware in [`crate::middleware::access`] does the session
//! lookup and turns decisions into responses.

pub mod policy;

pub use policy::{AccessPolicy, GateDecision, RouteCategory};
