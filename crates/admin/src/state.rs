//! Application state owned by a front-end.
//!
//! Holds the configuration, the backend client, and the one session store.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::error;

use crate::catalog::{CatalogApi, CatalogClient};
use crate::config::AdminConfig;
use crate::error::AppError;
use crate::services::session::SessionStore;
use crate::storage::{FileStorage, Storage};
use crate::views::Dashboard;

/// Everything a front-end needs, with the production client and file
/// storage as defaults.
#[derive(Debug)]
pub struct AppState<A = CatalogClient, S = FileStorage> {
    config: AdminConfig,
    api: Arc<A>,
    session: SessionStore<S>,
}

impl AppState {
    /// Build the client and restore the session from the configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file cannot be read.
    pub fn new(config: AdminConfig) -> Result<Self, AppError> {
        let api = Arc::new(CatalogClient::new(&config)?);
        let session = SessionStore::load(FileStorage::new(&config.session_file))?;
        Ok(Self {
            config,
            api,
            session,
        })
    }
}

impl<A: CatalogApi, S: Storage> AppState<A, S> {
    /// Assemble state from existing parts.
    #[must_use]
    pub const fn from_parts(config: AdminConfig, api: Arc<A>, session: SessionStore<S>) -> Self {
        Self {
            config,
            api,
            session,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AdminConfig {
        &self.config
    }

    #[must_use]
    pub const fn api(&self) -> &Arc<A> {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut SessionStore<S> {
        &mut self.session
    }

    /// The bearer token, or `AppError::NotAuthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in.
    pub fn token(&self) -> Result<&SecretString, AppError> {
        self.session.token().ok_or(AppError::NotAuthenticated)
    }

    /// Open the dashboard for the current session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in.
    pub fn open_dashboard(&self) -> Result<Dashboard<A>, AppError> {
        Dashboard::open(
            Arc::clone(&self.api),
            &self.session,
            self.config.search_debounce,
        )
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be cleared.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.session.logout(self.api.as_ref()).await?;
        Ok(())
    }

    /// Drop the session if `error` says the backend rejected it.
    ///
    /// Returns the error unchanged for reporting.
    pub fn check(&mut self, error: AppError) -> AppError {
        if error.is_unauthenticated() && self.session.is_authenticated() {
            if let Err(e) = self.session.invalidate() {
                error!(error = %e, "Failed to clear rejected session");
            }
        }
        error
    }
}
