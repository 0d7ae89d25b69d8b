//! The authenticated dashboard: product list plus create form.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::CatalogApi;
use crate::error::AppError;
use crate::services::auth::ProductCapabilities;
use crate::services::session::{SessionError, SessionStore};
use crate::storage::Storage;
use crate::views::product_form::{CREATE_NOT_PERMITTED, ProductForm};
use crate::views::product_list::{ProductListController, ProductListHandle};

/// One list controller and, for users who may create, one form.
///
/// A successful create reloads the list.
pub struct Dashboard<A> {
    api: Arc<A>,
    capabilities: ProductCapabilities,
    list: ProductListHandle,
    list_task: JoinHandle<()>,
    form: Option<ProductForm<A>>,
}

impl<A> std::fmt::Debug for Dashboard<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("capabilities", &self.capabilities)
            .field("has_form", &self.form.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: CatalogApi> Dashboard<A> {
    /// Open the dashboard for the current session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in.
    pub fn open<S: Storage>(
        api: Arc<A>,
        session: &SessionStore<S>,
        debounce: Duration,
    ) -> Result<Self, AppError> {
        let token = session.token().ok_or(AppError::NotAuthenticated)?.clone();
        let capabilities = session.authorizer().product_capabilities();

        let (list, list_task) = ProductListController::spawn(
            Arc::clone(&api),
            token.clone(),
            capabilities,
            debounce,
        );

        let form = ProductForm::new(Arc::clone(&api), token, capabilities)
            .ok()
            .map(|form| {
                let list = list.clone();
                form.on_created(move |product| {
                    debug!(product_id = ?product.map(|p| p.id), "Reloading list after create");
                    list.reload();
                })
            });

        info!(?capabilities, "Dashboard opened");
        Ok(Self {
            api,
            capabilities,
            list,
            list_task,
            form,
        })
    }

    /// The product list.
    #[must_use]
    pub const fn list(&self) -> &ProductListHandle {
        &self.list
    }

    /// The create form, if the user may create products.
    pub const fn form(&mut self) -> Option<&mut ProductForm<A>> {
        self.form.as_mut()
    }

    /// Notice to show in place of the form.
    #[must_use]
    pub const fn create_notice(&self) -> Option<&'static str> {
        if self.form.is_some() {
            None
        } else {
            Some(CREATE_NOT_PERMITTED)
        }
    }

    /// What the user may do with products.
    #[must_use]
    pub const fn capabilities(&self) -> ProductCapabilities {
        self.capabilities
    }

    /// Whether the backend has rejected the session token.
    #[must_use]
    pub fn session_expired(&self) -> bool {
        self.list.snapshot().session_expired
    }

    /// Stop the list controller and wait for it to finish.
    pub async fn close(self) {
        self.list.shutdown();
        drop(self.form);
        if let Err(e) = self.list_task.await {
            debug!(error = %e, "List controller ended abnormally");
        }
    }

    /// Tear down the dashboard and end the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be cleared.
    pub async fn logout<S: Storage>(self, session: &mut SessionStore<S>) -> Result<(), SessionError> {
        let api = Arc::clone(&self.api);
        self.close().await;
        session.logout(api.as_ref()).await
    }
}
