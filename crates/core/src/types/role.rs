//! Roles, permission names, and the static role-to-permission table.

use serde::{Deserialize, Serialize};

/// Permission names understood by the catalog backend.
pub mod permissions {
    /// View the product list.
    pub const PRODUCTS_VIEW: &str = "products-view";
    /// Create products.
    pub const PRODUCTS_CREATE: &str = "products-create";
    /// Edit existing products.
    pub const PRODUCTS_UPDATE: &str = "products-update";
    /// Delete products.
    pub const PRODUCTS_DELETE: &str = "products-delete";
}

use permissions::{PRODUCTS_CREATE, PRODUCTS_DELETE, PRODUCTS_UPDATE, PRODUCTS_VIEW};

/// Built-in role with a fixed permission bundle.
///
/// Only consulted for users that carry no explicit permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full product management.
    Admin,
    /// Everything except deleting products.
    Staff,
    /// Read-only access to the product list.
    Viewer,
}

impl Role {
    /// Permissions granted by this role.
    #[must_use]
    pub const fn grants(self) -> &'static [&'static str] {
        match self {
            Self::Admin => &[PRODUCTS_VIEW, PRODUCTS_CREATE, PRODUCTS_UPDATE, PRODUCTS_DELETE],
            Self::Staff => &[PRODUCTS_VIEW, PRODUCTS_CREATE, PRODUCTS_UPDATE],
            Self::Viewer => &[PRODUCTS_VIEW],
        }
    }

    /// Whether this role grants `permission`.
    #[must_use]
    pub fn grants_permission(self, permission: &str) -> bool {
        self.grants().contains(&permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A role as the backend sends it: a bare name or an object with a `name`.
///
/// Unknown role names are kept; they simply grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    /// `"admin"`
    Name(String),
    /// `{ "name": "admin", ... }`
    Named {
        /// Role name.
        name: String,
    },
}

impl RoleRef {
    /// The role's name regardless of representation.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Named { name } => name,
        }
    }

    /// The built-in role this name maps to, if any.
    #[must_use]
    pub fn known(&self) -> Option<Role> {
        self.name().parse().ok()
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        Self::Name(role.to_string())
    }
}
