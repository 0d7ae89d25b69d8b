//! Session-related types for the authenticated front-end.

use catalog_core::User;
use secrecy::SecretString;

/// An authenticated session: a bearer token and the user it belongs to.
///
/// A token without a user is not a session; the store discards it on load.
#[derive(Clone)]
pub struct Session {
    /// Bearer token sent with every backend request.
    pub token: SecretString,
    /// The logged-in user.
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Storage keys for session data.
pub mod keys {
    /// Key for the bearer token (stored raw).
    pub const TOKEN: &str = "token";

    /// Key for the user record (stored as JSON).
    pub const USER: &str = "user";

    /// Every session key, cleared together.
    pub const ALL: [&str; 2] = [TOKEN, USER];
}
