//! Front-end controllers.
//!
//! - `product_list` - Debounced, filterable product list
//! - `product_form` - Create-product form
//! - `dashboard` - List and form wired to one session

pub mod dashboard;
pub mod product_form;
pub mod product_list;

pub use dashboard::Dashboard;
pub use product_form::{FormError, ProductForm, ProductFormFields};
pub use product_list::{FilterState, ListSnapshot, ListStatus, ProductListController, ProductListHandle};

use crate::services::session::SessionStore;
use crate::storage::Storage;

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Credentials prompt.
    Login,
    /// Product management.
    Dashboard,
}

impl Route {
    /// Where a user with this session belongs: the dashboard when logged in,
    /// otherwise the login screen.
    #[must_use]
    pub const fn for_session<S: Storage>(session: &SessionStore<S>) -> Self {
        if session.is_authenticated() {
            Self::Dashboard
        } else {
            Self::Login
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::{User, UserId};
    use secrecy::SecretString;

    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_route_follows_session() {
        let mut session = SessionStore::load(MemoryStorage::new()).unwrap();
        assert_eq!(Route::for_session(&session), Route::Login);

        session
            .login(SecretString::from("t"), User::new(UserId::new(1), "Aina"))
            .unwrap();
        assert_eq!(Route::for_session(&session), Route::Dashboard);
    }
}
