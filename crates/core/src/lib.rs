//! Bezs core types and the RBAC authorization core
//!
//! This crate holds everything that does not need an HTTP stack: the grant
//! data model, the route pattern matcher, the RBAC resolver and the session
//! provider abstraction. It performs no I/O of its own.

pub mod access;
pub mod error;
pub mod listing;
pub mod validation;

#[cfg(feature = "tracing")]
pub mod tracing;

pub use access::{
    GrantRecord, MenuItem, MenuPermission, RoleRouteMap, RoutePattern, Session, SessionError,
    SessionProvider, SessionUser,
};
pub use error::{CoreError, CoreResult};
pub use validation::{ValidateConfig, validators};
