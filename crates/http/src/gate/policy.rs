//! Access decisions for a path and an optional session

use crate::config::RouteTable;
use bezs_core::Session;
use bezs_core::access::{
    RoutePattern, app_short_name, has_dot_segment, matches_any, resolve_role_route_map,
};
use serde::Serialize;
use std::fmt;

/// Which gate rule decided a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    /// The path contains `.` or `..` segments
    Rejected,
    Public,
    AuthOnly,
    Protected,
    Admin,
    RoleExempt,
    Rbac,
    Authenticated,
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rejected => "rejected",
            Self::Public => "public",
            Self::AuthOnly => "auth_only",
            Self::Protected => "protected",
            Self::Admin => "admin",
            Self::RoleExempt => "role_exempt",
            Self::Rbac => "rbac",
            Self::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Pass the request on. `annotate` asks for the original URL to be
    /// attached for downstream page code.
    Forward {
        category: RouteCategory,
        annotate: bool,
    },
    /// Turn the request away to `location`
    Redirect {
        category: RouteCategory,
        location: String,
    },
}

impl GateDecision {
    fn forward(category: RouteCategory) -> Self {
        Self::Forward {
            category,
            annotate: false,
        }
    }

    fn redirect(category: RouteCategory, location: &str) -> Self {
        Self::Redirect {
            category,
            location: location.to_string(),
        }
    }

    pub fn category(&self) -> RouteCategory {
        match self {
            Self::Forward { category, .. } | Self::Redirect { category, .. } => *category,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward { .. })
    }
}

/// The gate's rules over a [`RouteTable`]
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    routes: RouteTable,
}

impl AccessPolicy {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Whether the gate needs a session to decide this path
    pub fn requires_session(&self, path: &str) -> bool {
        !has_dot_segment(path) && !self.routes.is_public(path)
    }

    /// Decide what happens to a request for `path`.
    ///
    /// Rules apply in a fixed order and the first one that covers the path
    /// wins, so the admin console never falls through to the RBAC check and
    /// exempt areas never reach it either. Paths with dot segments are
    /// turned away before any rule sees them.
    pub fn decide(&self, path: &str, session: Option<&Session>) -> GateDecision {
        let routes = &self.routes;

        if has_dot_segment(path) {
            return GateDecision::redirect(
                RouteCategory::Rejected,
                &routes.unauthenticated_landing,
            );
        }

        if routes.is_public(path) {
            return GateDecision::forward(RouteCategory::Public);
        }

        if routes.is_auth_only(path) {
            return match session {
                Some(_) => GateDecision::redirect(RouteCategory::AuthOnly, &routes.post_login_route),
                None => GateDecision::forward(RouteCategory::AuthOnly),
            };
        }

        let Some(session) = session else {
            return GateDecision::redirect(RouteCategory::Protected, &routes.sign_in_route);
        };

        if routes.is_admin(path) {
            return if session.active_role() == routes.admin_role {
                GateDecision::forward(RouteCategory::Admin)
            } else {
                GateDecision::redirect(RouteCategory::Admin, &routes.unauthenticated_landing)
            };
        }

        if routes.is_role_exempt(path) {
            return GateDecision::forward(RouteCategory::RoleExempt);
        }

        if routes.is_under_app_root(path) {
            if self.role_may_access(session, path) {
                return GateDecision::Forward {
                    category: RouteCategory::Rbac,
                    annotate: true,
                };
            }

            debug!(
                app = app_short_name(path, &routes.app_root).unwrap_or_default(),
                role = session.active_role(),
                "No route pattern of the active role covers the path"
            );
            return GateDecision::redirect(
                RouteCategory::Rbac,
                &routes.unauthenticated_landing,
            );
        }

        GateDecision::forward(RouteCategory::Authenticated)
    }

    /// Resolve the active role's patterns from a fresh role-route map and
    /// test the path against each of them.
    fn role_may_access(&self, session: &Session, path: &str) -> bool {
        let role = session.active_role();
        let map = resolve_role_route_map(&session.grants);
        let Some(patterns) = map.routes_for(role) else {
            return false;
        };

        if patterns
            .iter()
            .filter_map(|pattern| RoutePattern::parse(pattern).ok())
            .any(|pattern| pattern.is_catch_all())
        {
            warn!(
                user_id = %session.user.id,
                role,
                "Role grants a catch-all route pattern"
            );
        }

        matches_any(patterns.iter().map(String::as_str), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bezs_core::{GrantRecord, MenuItem, MenuPermission, SessionUser};

    fn policy() -> AccessPolicy {
        AccessPolicy::new(RouteTable::default())
    }

    fn editor() -> Session {
        let grant = GrantRecord::new("org1", "editor")
            .with_app("app1")
            .with_menu_permission(MenuPermission::new(
                "app1",
                "/bezs/filenest",
                MenuItem::new("Docs", "/bezs/filenest/docs"),
            ))
            .with_menu_permission(MenuPermission::new(
                "app1",
                "/bezs/filenest",
                MenuItem::new("Files", "/bezs/filenest/:fileType"),
            ));
        Session::new(SessionUser::new("u1", "editor"), vec![grant])
    }

    fn admin() -> Session {
        Session::new(SessionUser::new("u0", "admin"), vec![])
    }

    fn redirect_to(decision: &GateDecision) -> Option<&str> {
        match decision {
            GateDecision::Redirect { location, .. } => Some(location),
            GateDecision::Forward { .. } => None,
        }
    }

    #[test]
    fn test_dot_segments_are_rejected_before_any_rule() {
        let policy = policy();
        let editor = editor();
        let admin = admin();

        for path in [
            "/api/auth/../../bezs/admin/users",
            "/assets/%2e%2e/bezs/admin",
            "/bezs/dashboard/../admin/users",
            "/bezs/dashboard/%2e%2e/admin/users",
            "/bezs/filenest/docs/../../admin",
            "/bezs/./admin",
        ] {
            assert!(!policy.requires_session(path), "{path}");
            for session in [None, Some(&editor), Some(&admin)] {
                assert_eq!(
                    policy.decide(path, session),
                    GateDecision::Redirect {
                        category: RouteCategory::Rejected,
                        location: "/".to_string(),
                    },
                    "{path}"
                );
            }
        }
    }

    #[test]
    fn test_public_paths_forward_without_session() {
        let policy = policy();
        assert!(!policy.requires_session("/"));
        assert!(!policy.requires_session("/api/auth/get-session"));
        assert!(policy.requires_session("/bezs/dashboard"));

        let decision = policy.decide("/api/auth/sign-in/email", None);
        assert_eq!(decision.category(), RouteCategory::Public);
        assert!(decision.is_forward());
    }

    #[test]
    fn test_auth_only_pages() {
        let policy = policy();

        let decision = policy.decide("/auth/sign-in", None);
        assert_eq!(decision.category(), RouteCategory::AuthOnly);
        assert!(decision.is_forward());

        let session = editor();
        let decision = policy.decide("/auth/sign-up", Some(&session));
        assert_eq!(redirect_to(&decision), Some("/bezs/dashboard"));
    }

    #[test]
    fn test_protected_without_session_goes_to_sign_in() {
        let policy = policy();
        for path in ["/bezs/dashboard", "/bezs/admin", "/bezs/filenest/docs", "/profile"] {
            let decision = policy.decide(path, None);
            assert_eq!(decision.category(), RouteCategory::Protected, "{path}");
            assert_eq!(redirect_to(&decision), Some("/auth/sign-in"), "{path}");
        }
    }

    #[test]
    fn test_admin_role_bypasses_rbac() {
        let policy = policy();
        let session = admin();

        let decision = policy.decide("/bezs/admin/users/5", Some(&session));
        assert_eq!(
            decision,
            GateDecision::Forward {
                category: RouteCategory::Admin,
                annotate: false
            }
        );
    }

    #[test]
    fn test_non_admin_is_turned_away_from_admin_even_with_matching_grant() {
        let grant = GrantRecord::new("org1", "editor")
            .with_app("app1")
            .with_menu_permission(MenuPermission::new(
                "app1",
                "/bezs/admin",
                MenuItem::new("Users", "/bezs/admin/*"),
            ));
        let session = Session::new(SessionUser::new("u1", "editor"), vec![grant]);

        let decision = policy().decide("/bezs/admin/users", Some(&session));
        assert_eq!(decision.category(), RouteCategory::Admin);
        assert_eq!(redirect_to(&decision), Some("/"));
    }

    #[test]
    fn test_admin_role_match_is_exact() {
        let session = Session::new(SessionUser::new("u1", "Admin"), vec![]);
        let decision = policy().decide("/bezs/admin", Some(&session));
        assert_eq!(redirect_to(&decision), Some("/"));
    }

    #[test]
    fn test_role_exempt_areas_forward_for_any_role() {
        let session = Session::new(SessionUser::new("u1", "nobody"), vec![]);
        for path in ["/bezs/dashboard", "/bezs/apps", "/bezs/calendar/2024", "/bezs/api/rbac/routes"] {
            let decision = policy().decide(path, Some(&session));
            assert_eq!(decision.category(), RouteCategory::RoleExempt, "{path}");
            assert!(decision.is_forward(), "{path}");
        }
    }

    #[test]
    fn test_rbac_forwards_granted_paths_with_annotation() {
        let session = editor();
        let decision = policy().decide("/bezs/filenest/docs", Some(&session));
        assert_eq!(
            decision,
            GateDecision::Forward {
                category: RouteCategory::Rbac,
                annotate: true
            }
        );

        // The app slug itself is granted along with its menu entries.
        assert!(policy().decide("/bezs/filenest", Some(&session)).is_forward());
        assert!(policy().decide("/bezs/filenest/images", Some(&session)).is_forward());
    }

    #[test]
    fn test_rbac_redirects_ungranted_paths_to_landing() {
        let session = editor();
        for path in ["/bezs/filenest/images/extra", "/bezs/chat", "/bezs/filenest-pro"] {
            let decision = policy().decide(path, Some(&session));
            assert_eq!(decision.category(), RouteCategory::Rbac, "{path}");
            assert_eq!(redirect_to(&decision), Some("/"), "{path}");
        }
    }

    #[test]
    fn test_rbac_uses_only_the_active_role() {
        let mut session = editor();
        session.user.role = "viewer".to_string();
        let decision = policy().decide("/bezs/filenest/docs", Some(&session));
        assert_eq!(redirect_to(&decision), Some("/"));
    }

    #[test]
    fn test_rbac_ignores_apps_the_organization_has_not_enabled() {
        let grant = GrantRecord::new("org1", "editor").with_menu_permission(MenuPermission::new(
            "app1",
            "/bezs/filenest",
            MenuItem::new("Docs", "/bezs/filenest/docs"),
        ));
        let session = Session::new(SessionUser::new("u1", "editor"), vec![grant]);
        let decision = policy().decide("/bezs/filenest/docs", Some(&session));
        assert_eq!(redirect_to(&decision), Some("/"));
    }

    #[test]
    fn test_catch_all_grant_matches_everything_under_root() {
        let grant = GrantRecord::new("org1", "owner")
            .with_app("app1")
            .with_menu_permission(MenuPermission::new("app1", "*", MenuItem::new("All", "*")));
        let session = Session::new(SessionUser::new("u1", "owner"), vec![grant]);
        assert!(policy().decide("/bezs/anything/at/all", Some(&session)).is_forward());
    }

    #[test]
    fn test_authenticated_paths_outside_app_root_forward() {
        let session = Session::new(SessionUser::new("u1", "nobody"), vec![]);
        let decision = policy().decide("/profile", Some(&session));
        assert_eq!(
            decision,
            GateDecision::Forward {
                category: RouteCategory::Authenticated,
                annotate: false
            }
        );
    }
}
