//! RBAC resolution
//!
//! Pure functions that flatten a user's grant records into the structures
//! the access gate and the application shells consume. Nothing here is
//! cached; callers resolve again from a fresh session on every request.
//!
//! Every permission is filtered against the `organization_apps` of the grant
//! it came from. A role may list permissions for an application its
//! organization has not enabled, and those must never surface.

use super::grants::{GrantRecord, MenuItem};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Role name to the set of route patterns visible to holders of that role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleRouteMap(BTreeMap<String, BTreeSet<String>>);

impl RoleRouteMap {
    /// Routes visible to the given role, if it has any
    pub fn routes_for(&self, role: &str) -> Option<&BTreeSet<String>> {
        self.0.get(role)
    }

    /// Roles that resolved to at least one route
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeSet<String>> {
        self.0
    }
}

/// Build the role-route map for every role the user holds.
///
/// For each effective menu permission both the application slug and the
/// menu item slug are added under the grant's role name. Grants that share
/// a role name are merged, so a user holding the same role in two
/// organizations sees the union of both.
pub fn resolve_role_route_map(grants: &[GrantRecord]) -> RoleRouteMap {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for grant in grants {
        for permission in grant.effective_menu_permissions() {
            let routes = map.entry(grant.role_name.clone()).or_default();
            routes.insert(permission.app_slug.clone());
            routes.insert(permission.menu_item.slug.clone());
        }
    }

    RoleRouteMap(map)
}

/// Menu entries the user can see inside one application, across all roles.
///
/// Entries keep the order in which they are first encountered (grant order,
/// then permission order) and are deduplicated by slug. An empty
/// application name or an empty grant list yields no entries.
pub fn resolve_app_menu_items(grants: &[GrantRecord], app_short_name: &str) -> Vec<MenuItem> {
    if app_short_name.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for grant in grants {
        for permission in grant.effective_menu_permissions() {
            if slug_short_name(&permission.app_slug) != Some(app_short_name) {
                continue;
            }
            if seen.insert(permission.menu_item.slug.as_str()) {
                items.push(permission.menu_item.clone());
            }
        }
    }

    items
}

/// Action names enabled inside one application, across all roles
pub fn resolve_app_actions(grants: &[GrantRecord], app_short_name: &str) -> BTreeSet<String> {
    if app_short_name.is_empty() {
        return BTreeSet::new();
    }

    grants
        .iter()
        .flat_map(GrantRecord::effective_action_permissions)
        .filter(|permission| slug_short_name(&permission.app_slug) == Some(app_short_name))
        .map(|permission| permission.action.clone())
        .collect()
}

/// The page an application should open on: the first entry with an icon
pub fn initial_landing_page(items: &[MenuItem]) -> Option<&MenuItem> {
    items.iter().find(|item| !item.icon.trim().is_empty())
}

/// Extract the application short name from a request path.
///
/// With `app_root` set to `/bezs`, `/bezs/filenest/docs` yields `filenest`.
pub fn app_short_name<'a>(path: &'a str, app_root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(app_root.trim_end_matches('/'))?;
    let rest = rest.strip_prefix('/')?;
    rest.split('/').next().filter(|segment| !segment.is_empty())
}

/// Trailing segment of an application slug (`/bezs/filenest` → `filenest`)
fn slug_short_name(app_slug: &str) -> Option<&str> {
    app_slug
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
