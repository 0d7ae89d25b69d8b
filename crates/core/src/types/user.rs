//! The authenticated catalog user.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::role::RoleRef;

/// A user as returned by the backend at login.
///
/// Immutable once fetched; a new login replaces it wholesale. Either
/// `permissions` or `roles` (or neither) may be present; see
/// `catalog_admin::services::auth::Authorizer` for how they are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct User {
    /// Backend user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Flat permission names such as `products-delete`. Takes precedence
    /// over `roles` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,
    /// Role names or role objects; only consulted without `permissions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<RoleRef>>,
}

impl User {
    /// Create a user with no permissions and no roles.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            permissions: None,
            roles: None,
        }
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the explicit permission list.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the roles.
    #[must_use]
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_backend_json() {
        let json = r#"{
            "id": 1,
            "name": "Aina",
            "email": "aina@example.com",
            "roles": [{"id": 2, "name": "staff"}]
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert!(user.permissions.is_none());
        assert_eq!(user.roles.map(|roles| roles.len()), Some(1));
    }

    #[test]
    fn test_null_permissions_is_absent() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "name": "x", "permissions": null}"#).unwrap();
        assert!(user.permissions.is_none());
    }

    #[test]
    fn test_serde_roundtrip_keeps_permissions() {
        let user = User::new(UserId::new(5), "Kai").with_permissions(["products-view"]);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("roles"));
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }
}
