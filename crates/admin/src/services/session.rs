//! The session store: the single owner of the authenticated session.
//!
//! Exactly one `SessionStore` exists per front-end. Everything that needs
//! the current user or token borrows it from there.

use catalog_core::User;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{ApiError, CatalogApi, Credentials};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session::{Session, keys};
use crate::services::auth::Authorizer;
use crate::storage::{Storage, StorageError};

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The user record could not be encoded.
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The login request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owns the persisted and in-memory session.
///
/// In-memory state always mirrors what was last persisted successfully.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    session: Option<Session>,
}

impl<S: Storage> SessionStore<S> {
    /// Restore the session from `storage`.
    ///
    /// A stored token without a readable stored user is an invalid session
    /// and both keys are cleared. So is a store whose contents cannot be
    /// decoded at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read, or cannot be cleared
    /// after an invalid session was found.
    pub fn load(storage: S) -> Result<Self, SessionError> {
        let stored = storage
            .get(keys::TOKEN)
            .and_then(|token| storage.get(keys::USER).map(|user| (token, user)));
        let (token, user) = match stored {
            Ok(pair) => pair,
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "Stored session is corrupt, clearing");
                storage.remove_all(&keys::ALL)?;
                (None, None)
            }
            Err(e) => return Err(e.into()),
        };

        let session = match (token, user) {
            (None, None) => None,
            (Some(token), Some(user)) => match serde_json::from_str::<User>(&user) {
                Ok(user) => Some(Session {
                    token: SecretString::from(token),
                    user,
                }),
                Err(e) => {
                    warn!(error = %e, "Stored user is unreadable, clearing session");
                    storage.remove_all(&keys::ALL)?;
                    None
                }
            },
            (token, _) => {
                warn!(
                    has_token = token.is_some(),
                    "Incomplete stored session, clearing"
                );
                storage.remove_all(&keys::ALL)?;
                None
            }
        };

        if let Some(session) = &session {
            debug!(user_id = %session.user.id, "Session restored");
            set_sentry_user(session.user.id.as_i64(), session.user.email.as_deref());
        }
        Ok(Self { storage, session })
    }

    /// Record a successful login.
    ///
    /// Token and user are persisted together or not at all; in-memory state
    /// changes only after the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be encoded or the storage write fails.
    pub fn login(&mut self, token: SecretString, user: User) -> Result<&User, SessionError> {
        let encoded = serde_json::to_string(&user)?;
        self.storage.set_all(&[
            (keys::TOKEN, token.expose_secret().to_owned()),
            (keys::USER, encoded),
        ])?;

        info!(user_id = %user.id, "Logged in");
        set_sentry_user(user.id.as_i64(), user.email.as_deref());
        Ok(&self.session.insert(Session { token, user }).user)
    }

    /// Authenticate against the backend and record the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the backend rejects the login, or a
    /// storage error if the session cannot be persisted.
    pub async fn authenticate<A: CatalogApi>(
        &mut self,
        api: &A,
        credentials: &Credentials,
    ) -> Result<&User, SessionError> {
        let response = api.login(credentials).await?;
        self.login(response.token, response.user)
    }

    /// End the session.
    ///
    /// Notifies the backend on a best-effort basis (a failure is logged and
    /// otherwise ignored), then clears in-memory and persisted state no
    /// matter what the backend said.
    ///
    /// # Errors
    ///
    /// Returns an error only if the persisted keys cannot be removed; the
    /// in-memory session is gone either way.
    pub async fn logout<A: CatalogApi>(&mut self, api: &A) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            match api.logout(&session.token).await {
                Ok(()) => debug!("Backend logout succeeded"),
                Err(e) => warn!(error = %e, "Backend logout failed, clearing session anyway"),
            }
        }
        self.clear()
    }

    /// Drop the session without contacting the backend.
    ///
    /// Used when the backend reports the token as invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted keys cannot be removed.
    pub fn invalidate(&mut self) -> Result<(), SessionError> {
        warn!("Session rejected by backend, clearing");
        self.clear()
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user.id, "Session cleared");
        }
        clear_sentry_user();
        self.storage.remove_all(&keys::ALL)?;
        Ok(())
    }

    /// The logged-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// The bearer token of the current session.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.session.as_ref().map(|session| &session.token)
    }

    /// The whole session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Permission resolver for the current user.
    #[must_use]
    pub fn authorizer(&self) -> Authorizer<'_> {
        Authorizer::new(self.current_user())
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use catalog_core::UserId;

    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use crate::testing::FakeCatalog;

    fn user() -> User {
        User::new(UserId::new(7), "Aina").with_roles(["admin"])
    }

    #[test]
    fn test_load_empty_storage() {
        let store = SessionStore::load(MemoryStorage::new()).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_login_persists_and_restores() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SessionStore::load(Arc::clone(&storage)).unwrap();
        store.login(SecretString::from("tok"), user()).unwrap();
        assert!(store.is_authenticated());

        let restored = SessionStore::load(Arc::clone(&storage)).unwrap();
        assert_eq!(restored.current_user(), Some(&user()));
        assert_eq!(restored.token().unwrap().expose_secret(), "tok");
    }

    #[test]
    fn test_token_without_user_is_cleared() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_all(&[(keys::TOKEN, "orphan".into())]).unwrap();

        let store = SessionStore::load(Arc::clone(&storage)).unwrap();
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_unreadable_user_is_cleared() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_all(&[(keys::TOKEN, "t".into()), (keys::USER, "not json".into())])
            .unwrap();

        let store = SessionStore::load(Arc::clone(&storage)).unwrap();
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_session_file_is_cleared() {
        let dir = std::env::temp_dir().join(format!("catalog-session-corrupt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::load(FileStorage::new(&path)).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.storage().get(keys::TOKEN).unwrap(), None);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&contents).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SessionStore::load(Arc::clone(&storage)).unwrap();
        store.login(SecretString::from("tok"), user()).unwrap();

        let api = FakeCatalog::new().failing_logout();
        store.logout(&api).await.unwrap();

        assert_eq!(api.logout_calls(), 1);
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_backend() {
        let mut store = SessionStore::load(MemoryStorage::new()).unwrap();
        let api = FakeCatalog::new();
        store.logout(&api).await.unwrap();
        assert_eq!(api.logout_calls(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_records_session() {
        let api = FakeCatalog::new().with_login_user(user());
        let mut store = SessionStore::load(MemoryStorage::new()).unwrap();
        let credentials = Credentials {
            email: "aina@example.com".into(),
            password: SecretString::from("pw"),
        };

        let logged_in = store.authenticate(&api, &credentials).await.unwrap();
        assert_eq!(logged_in.id, UserId::new(7));
        assert!(store.authorizer().has_role("admin"));
    }

    #[tokio::test]
    async fn test_authenticate_rejected_leaves_store_empty() {
        let api = FakeCatalog::new();
        let mut store = SessionStore::load(MemoryStorage::new()).unwrap();
        let credentials = Credentials {
            email: "x@example.com".into(),
            password: SecretString::from("bad"),
        };

        let err = store.authenticate(&api, &credentials).await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::InvalidCredentials(_))));
        assert!(!store.is_authenticated());
    }
}
