//! RBAC authorization core
//!
//! Grant records are flattened by the [`resolver`] into role-route maps and
//! per-application menus, and request paths are checked against route
//! patterns by the [`pattern`] matcher.

pub mod grants;
pub mod pattern;
pub mod resolver;
pub mod session;

pub use grants::{
    ActionPermission, GrantError, GrantRecord, MenuItem, MenuPermission, RawActionPermission,
    RawGrant, RawMenuItem, RawMenuPermission,
};
pub use pattern::{PatternError, RoutePattern, has_dot_segment, matches, matches_any};
pub use resolver::{
    RoleRouteMap, app_short_name, initial_landing_page, resolve_app_actions,
    resolve_app_menu_items, resolve_role_route_map,
};
pub use session::{
    RawSession, RawSessionUser, Session, SessionError, SessionProvider, SessionUser,
    StaticSessionProvider,
};
