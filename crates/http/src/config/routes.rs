//! Static route classification for the access gate

use bezs_core::{ValidateConfig, validators};
use config::ConfigError;
use serde::{Deserialize, Serialize};

/// Which paths are public, which are for signed-out users only, and where
/// the gate sends people it turns away.
///
/// Every prefix check is segment-aware: `/bezs/admin` covers `/bezs/admin`
/// and `/bezs/admin/users` but not `/bezs/administration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Paths that are public only as an exact match (the landing page)
    pub public_paths: Vec<String>,
    /// Prefixes whose whole subtree is public (auth API, static assets)
    pub public_prefixes: Vec<String>,
    /// Prefixes of pages meant for signed-out users only, such as
    /// `/auth/two-factor`, which also covers `/auth/two-factor/otp`
    pub auth_only_prefixes: Vec<String>,
    /// Authenticated areas reachable by every role
    pub role_exempt_prefixes: Vec<String>,
    /// Prefix of the admin console
    pub admin_prefix: String,
    /// Role that may open the admin console
    pub admin_role: String,
    /// Root under which applications live and RBAC applies
    pub app_root: String,
    /// Where signed-out users are sent
    pub sign_in_route: String,
    /// Where denied users are sent
    pub unauthenticated_landing: String,
    /// Where signed-in users hitting an auth-only page are sent
    pub post_login_route: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public_paths: strings(&["/", "/health", "/openapi.json", "/favicon.ico"]),
            public_prefixes: strings(&["/api/auth", "/assets", "/_next"]),
            auth_only_prefixes: strings(&[
                "/auth/sign-in",
                "/auth/sign-up",
                "/auth/forgot-password",
                "/auth/reset-password",
                "/auth/two-factor",
                "/auth/verify-email",
            ]),
            role_exempt_prefixes: strings(&[
                "/bezs/dashboard",
                "/bezs/apps",
                "/bezs/calendar",
                "/bezs/api/rbac",
            ]),
            admin_prefix: "/bezs/admin".to_string(),
            admin_role: "admin".to_string(),
            app_root: "/bezs".to_string(),
            sign_in_route: "/auth/sign-in".to_string(),
            unauthenticated_landing: "/".to_string(),
            post_login_route: "/bezs/dashboard".to_string(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Segment-aware prefix test
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl RouteTable {
    /// Public paths need no session at all
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| public == path)
            || self
                .public_prefixes
                .iter()
                .any(|prefix| has_path_prefix(path, prefix))
    }

    pub fn is_auth_only(&self, path: &str) -> bool {
        self.auth_only_prefixes
            .iter()
            .any(|prefix| has_path_prefix(path, prefix))
    }

    pub fn is_admin(&self, path: &str) -> bool {
        has_path_prefix(path, &self.admin_prefix)
    }

    pub fn is_role_exempt(&self, path: &str) -> bool {
        self.role_exempt_prefixes
            .iter()
            .any(|prefix| has_path_prefix(path, prefix))
    }

    pub fn is_under_app_root(&self, path: &str) -> bool {
        has_path_prefix(path, &self.app_root)
    }
}

impl ValidateConfig for RouteTable {
    fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("routes.public_paths", &self.public_paths),
            ("routes.public_prefixes", &self.public_prefixes),
            ("routes.auth_only_prefixes", &self.auth_only_prefixes),
            ("routes.role_exempt_prefixes", &self.role_exempt_prefixes),
        ];
        for (field, paths) in lists {
            for path in paths {
                validators::validate_absolute_path(path, field)?;
            }
        }

        let singles = [
            ("routes.admin_prefix", &self.admin_prefix),
            ("routes.app_root", &self.app_root),
            ("routes.sign_in_route", &self.sign_in_route),
            ("routes.unauthenticated_landing", &self.unauthenticated_landing),
            ("routes.post_login_route", &self.post_login_route),
        ];
        for (field, path) in singles {
            validators::validate_absolute_path(path, field)?;
        }

        validators::validate_not_empty(&self.admin_role, "routes.admin_role")?;

        // Redirect targets must not bounce back through the same gate rule.
        if !self.is_public(&self.sign_in_route) && !self.is_auth_only(&self.sign_in_route) {
            return Err(ConfigError::Message(format!(
                "routes.sign_in_route: '{}' must be public or auth-only",
                self.sign_in_route
            )));
        }
        if !self.is_public(&self.unauthenticated_landing) {
            return Err(ConfigError::Message(format!(
                "routes.unauthenticated_landing: '{}' must be public",
                self.unauthenticated_landing
            )));
        }
        if self.is_auth_only(&self.post_login_route) {
            return Err(ConfigError::Message(format!(
                "routes.post_login_route: '{}' cannot be an auth-only page",
                self.post_login_route
            )));
        }

        Ok(())
    }
}
