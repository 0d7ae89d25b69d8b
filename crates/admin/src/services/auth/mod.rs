//! Permission resolution for the current user.
//!
//! Explicit permissions on the user are authoritative. Only when the user
//! carries no permission list are its roles mapped through the built-in
//! role table. With no user at all every check is false.

use std::collections::BTreeSet;

use catalog_core::{User, permissions};

/// Answers permission and role questions about an optional user.
///
/// Pure: holds a borrow of the user and never touches I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authorizer<'a> {
    user: Option<&'a User>,
}

impl<'a> Authorizer<'a> {
    /// Resolver for `user`; `None` means nobody is logged in.
    #[must_use]
    pub const fn new(user: Option<&'a User>) -> Self {
        Self { user }
    }

    /// The user being checked.
    #[must_use]
    pub const fn user(&self) -> Option<&'a User> {
        self.user
    }

    /// Whether the user holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        let Some(user) = self.user else {
            return false;
        };
        if let Some(granted) = &user.permissions {
            return granted.contains(permission);
        }
        user.roles.as_ref().is_some_and(|roles| {
            roles
                .iter()
                .filter_map(catalog_core::RoleRef::known)
                .any(|role| role.grants_permission(permission))
        })
    }

    /// Whether the user has a role named `role`.
    ///
    /// Matches by name only, so roles unknown to the built-in table still match.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.user
            .and_then(|user| user.roles.as_ref())
            .is_some_and(|roles| roles.iter().any(|r| r.name() == role))
    }

    /// The full resolved permission set.
    #[must_use]
    pub fn effective_permissions(&self) -> BTreeSet<String> {
        let Some(user) = self.user else {
            return BTreeSet::new();
        };
        if let Some(granted) = &user.permissions {
            return granted.clone();
        }
        user.roles
            .iter()
            .flatten()
            .filter_map(catalog_core::RoleRef::known)
            .flat_map(|role| role.grants().iter().map(|p| (*p).to_owned()))
            .collect()
    }

    /// What the user may do with products.
    #[must_use]
    pub fn product_capabilities(&self) -> ProductCapabilities {
        ProductCapabilities {
            view: self.has_permission(permissions::PRODUCTS_VIEW),
            create: self.has_permission(permissions::PRODUCTS_CREATE),
            update: self.has_permission(permissions::PRODUCTS_UPDATE),
            delete: self.has_permission(permissions::PRODUCTS_DELETE),
        }
    }
}

/// Resolved product permissions, detached from the user borrow so
/// controllers running on their own task can hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProductCapabilities {
    pub view: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl ProductCapabilities {
    /// Every product permission granted.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            view: true,
            create: true,
            update: true,
            delete: true,
        }
    }

    /// Whether the table needs an Actions column.
    #[must_use]
    pub const fn shows_actions(&self) -> bool {
        self.update || self.delete
    }
}
