//! Sorting and filtering of grant listings
//!
//! Sort and filter fields arrive as query-string text. They are parsed into
//! closed enums before use, so an unknown field is rejected up front instead
//! of being used to index into a record.

use crate::access::GrantRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListQueryError {
    #[error("Unknown sort field '{0}'")]
    UnknownSortField(String),

    #[error("Unknown filter field '{0}'")]
    UnknownFilterField(String),

    #[error("Unknown sort order '{0}', expected 'asc' or 'desc'")]
    UnknownSortOrder(String),

    #[error("Filter must look like field:value, got '{0}'")]
    InvalidFilter(String),
}

/// Fields a grant listing may be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum GrantSortField {
    #[default]
    OrganizationId,
    RoleName,
    AppCount,
    MenuCount,
}

impl GrantSortField {
    pub const ALLOWED: [&'static str; 4] = ["organizationId", "roleName", "appCount", "menuCount"];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrganizationId => "organizationId",
            Self::RoleName => "roleName",
            Self::AppCount => "appCount",
            Self::MenuCount => "menuCount",
        }
    }
}

impl FromStr for GrantSortField {
    type Err = ListQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizationId" => Ok(Self::OrganizationId),
            "roleName" => Ok(Self::RoleName),
            "appCount" => Ok(Self::AppCount),
            "menuCount" => Ok(Self::MenuCount),
            other => Err(ListQueryError::UnknownSortField(other.to_string())),
        }
    }
}

/// Fields a grant listing may be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrantFilterField {
    OrganizationId,
    RoleName,
}

impl FromStr for GrantFilterField {
    type Err = ListQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizationId" => Ok(Self::OrganizationId),
            "roleName" => Ok(Self::RoleName),
            other => Err(ListQueryError::UnknownFilterField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ListQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ListQueryError::UnknownSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// One row of a grant listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GrantSummary {
    pub organization_id: String,
    pub role_id: Option<String>,
    pub role_name: String,
    pub app_count: usize,
    pub menu_count: usize,
    pub action_count: usize,
}

impl From<&GrantRecord> for GrantSummary {
    fn from(grant: &GrantRecord) -> Self {
        Self {
            organization_id: grant.organization_id.clone(),
            role_id: grant.role_id.clone(),
            role_name: grant.role_name.clone(),
            app_count: grant.organization_apps.len(),
            menu_count: grant.effective_menu_permissions().count(),
            action_count: grant.effective_action_permissions().count(),
        }
    }
}

/// A validated listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: GrantSortField,
    pub order: SortOrder,
    pub filter: Option<(GrantFilterField, String)>,
}

impl ListQuery {
    /// Parse raw query parameters. `filter` has the form `field:value`.
    pub fn parse(
        sort: Option<&str>,
        order: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Self, ListQueryError> {
        let sort = sort.map(str::parse::<GrantSortField>).transpose()?.unwrap_or_default();
        let order = order.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default();
        let filter = filter
            .map(|raw| {
                let (field, value) = raw
                    .split_once(':')
                    .ok_or_else(|| ListQueryError::InvalidFilter(raw.to_string()))?;
                Ok::<_, ListQueryError>((field.parse::<GrantFilterField>()?, value.to_string()))
            })
            .transpose()?;

        Ok(Self {
            sort,
            order,
            filter,
        })
    }

    /// Summarize, filter and sort the grants
    pub fn apply(&self, grants: &[GrantRecord]) -> Vec<GrantSummary> {
        let mut rows: Vec<GrantSummary> = grants
            .iter()
            .filter(|grant| self.keeps(grant))
            .map(GrantSummary::from)
            .collect();

        rows.sort_by(|a, b| {
            let ordering = compare(self.sort, a, b);
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        rows
    }

    fn keeps(&self, grant: &GrantRecord) -> bool {
        match &self.filter {
            None => true,
            Some((GrantFilterField::OrganizationId, value)) => grant.organization_id == *value,
            Some((GrantFilterField::RoleName, value)) => grant.role_name == *value,
        }
    }
}

fn compare(field: GrantSortField, a: &GrantSummary, b: &GrantSummary) -> Ordering {
    match field {
        GrantSortField::OrganizationId => a.organization_id.cmp(&b.organization_id),
        GrantSortField::RoleName => a.role_name.cmp(&b.role_name),
        GrantSortField::AppCount => a.app_count.cmp(&b.app_count),
        GrantSortField::MenuCount => a.menu_count.cmp(&b.menu_count),
    }
}
