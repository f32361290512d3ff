//! Grant records and their validation
//!
//! The session provider hands us loosely shaped JSON. The `Raw*` types
//! mirror that wire format with every field optional; converting them into
//! [`GrantRecord`] is the single place where malformed data is dropped, so
//! the resolver can assume well-formed input.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors raised while validating a raw grant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),
}

/// A navigable menu entry inside one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Grants visibility of one menu entry within one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPermission {
    pub app_id: String,
    pub app_slug: String,
    pub menu_item: MenuItem,
}

/// Grants one fine-grained in-app action (button, link)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPermission {
    pub app_id: String,
    pub app_slug: String,
    pub menu_item_slug: String,
    pub action: String,
}

/// One organization membership and the role held in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    pub organization_id: String,
    pub role_id: Option<String>,
    pub role_name: String,
    /// Application ids the organization has enabled, in first-seen order
    pub organization_apps: Vec<String>,
    pub menu_permissions: Vec<MenuPermission>,
    pub action_permissions: Vec<ActionPermission>,
}

impl GrantRecord {
    /// Create a grant with no enabled apps and no permissions
    pub fn new(organization_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            role_id: None,
            role_name: role_name.into(),
            organization_apps: Vec::new(),
            menu_permissions: Vec::new(),
            action_permissions: Vec::new(),
        }
    }

    pub fn with_role_id(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// Enable an application for the grant's organization
    pub fn with_app(mut self, app_id: impl Into<String>) -> Self {
        let app_id = app_id.into();
        if !self.organization_apps.contains(&app_id) {
            self.organization_apps.push(app_id);
        }
        self
    }

    pub fn with_menu_permission(mut self, permission: MenuPermission) -> Self {
        self.menu_permissions.push(permission);
        self
    }

    pub fn with_action_permission(mut self, permission: ActionPermission) -> Self {
        self.action_permissions.push(permission);
        self
    }

    /// Whether the organization has enabled the given application
    pub fn enables_app(&self, app_id: &str) -> bool {
        self.organization_apps.iter().any(|id| id == app_id)
    }

    /// Menu permissions whose application is enabled for this organization
    pub fn effective_menu_permissions(&self) -> impl Iterator<Item = &MenuPermission> {
        self.menu_permissions
            .iter()
            .filter(|permission| self.enables_app(&permission.app_id))
    }

    /// Action permissions whose application is enabled for this organization
    pub fn effective_action_permissions(&self) -> impl Iterator<Item = &ActionPermission> {
        self.action_permissions
            .iter()
            .filter(|permission| self.enables_app(&permission.app_id))
    }
}

impl MenuPermission {
    pub fn new(app_id: impl Into<String>, app_slug: impl Into<String>, menu_item: MenuItem) -> Self {
        Self {
            app_id: app_id.into(),
            app_slug: app_slug.into(),
            menu_item,
        }
    }
}

impl MenuItem {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            icon: String::new(),
            description: String::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl ActionPermission {
    pub fn new(
        app_id: impl Into<String>,
        app_slug: impl Into<String>,
        menu_item_slug: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_slug: app_slug.into(),
            menu_item_slug: menu_item_slug.into(),
            action: action.into(),
        }
    }
}

/// Wire shape of a menu item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMenuItem {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// Wire shape of a role menu permission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMenuPermission {
    pub app_id: Option<String>,
    pub app_slug: Option<String>,
    pub menu_item: Option<RawMenuItem>,
}

/// Wire shape of a role action permission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawActionPermission {
    pub app_id: Option<String>,
    pub app_slug: Option<String>,
    pub menu_item_slug: Option<String>,
    pub action: Option<String>,
}

/// Wire shape of a grant record as delivered by the session provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGrant {
    pub organization_id: Option<String>,
    pub role_id: Option<String>,
    pub role_name: Option<String>,
    pub organization_apps: Option<Vec<String>>,
    pub role_menu_permissions: Option<Vec<RawMenuPermission>>,
    pub role_action_permissions: Option<Vec<RawActionPermission>>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, GrantError> {
    match value {
        None => Err(GrantError::MissingField(field)),
        Some(value) if value.trim().is_empty() => Err(GrantError::EmptyField(field)),
        Some(value) => Ok(value),
    }
}

impl TryFrom<RawMenuPermission> for MenuPermission {
    type Error = GrantError;

    fn try_from(raw: RawMenuPermission) -> Result<Self, Self::Error> {
        let item = raw.menu_item.ok_or(GrantError::MissingField("menuItem"))?;
        Ok(Self {
            app_id: required(raw.app_id, "appId")?,
            app_slug: required(raw.app_slug, "appSlug")?,
            menu_item: MenuItem {
                name: item.name.unwrap_or_default(),
                slug: required(item.slug, "menuItem.slug")?,
                icon: item.icon.unwrap_or_default(),
                description: item.description.unwrap_or_default(),
            },
        })
    }
}

impl TryFrom<RawActionPermission> for ActionPermission {
    type Error = GrantError;

    fn try_from(raw: RawActionPermission) -> Result<Self, Self::Error> {
        Ok(Self {
            app_id: required(raw.app_id, "appId")?,
            app_slug: required(raw.app_slug, "appSlug")?,
            menu_item_slug: raw.menu_item_slug.unwrap_or_default(),
            action: required(raw.action, "action")?,
        })
    }
}

impl TryFrom<RawGrant> for GrantRecord {
    type Error = GrantError;

    /// Validate a raw grant.
    ///
    /// A grant without an organization or role is rejected outright. Missing
    /// nested lists count as empty, and individual permissions that fail
    /// validation are dropped so the rest of the grant still resolves.
    fn try_from(raw: RawGrant) -> Result<Self, Self::Error> {
        let organization_id = required(raw.organization_id, "organizationId")?;
        let role_name = required(raw.role_name, "roleName")?;

        let mut grant = Self::new(organization_id, role_name);
        grant.role_id = raw.role_id.filter(|id| !id.trim().is_empty());

        for app_id in raw.organization_apps.unwrap_or_default() {
            grant = grant.with_app(app_id);
        }

        for raw_permission in raw.role_menu_permissions.unwrap_or_default() {
            match MenuPermission::try_from(raw_permission) {
                Ok(permission) => grant.menu_permissions.push(permission),
                Err(e) => warn!(
                    organization_id = %grant.organization_id,
                    role = %grant.role_name,
                    "Dropping malformed menu permission: {e}"
                ),
            }
        }

        for raw_permission in raw.role_action_permissions.unwrap_or_default() {
            match ActionPermission::try_from(raw_permission) {
                Ok(permission) => grant.action_permissions.push(permission),
                Err(e) => warn!(
                    organization_id = %grant.organization_id,
                    role = %grant.role_name,
                    "Dropping malformed action permission: {e}"
                ),
            }
        }

        Ok(grant)
    }
}
