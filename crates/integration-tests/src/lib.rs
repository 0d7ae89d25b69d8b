//! Integration tests for the catalog admin.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```
//!
//! The tests drive the admin library end to end against the in-memory
//! `FakeCatalog` backend, so no server is needed. Timing-sensitive tests
//! run on tokio's paused clock.
//!
//! # Test Files
//!
//! - `dashboard_flow` - Login, browse, create, delete, logout
//! - `search_debounce` - Quiet-period and filter-reset behavior
//! - `session_guard` - Routing, persistence, and expired sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use catalog_admin::AppState;
use catalog_admin::config::AdminConfig;
use catalog_admin::services::SessionStore;
use catalog_admin::storage::{MemoryStorage, Storage};
use catalog_admin::testing::{FakeCatalog, category, product};
use catalog_core::{User, UserId};
use secrecy::SecretString;

/// Debounce used across the tests.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// A catalog with two categories and three products.
#[must_use]
pub fn seeded_catalog() -> FakeCatalog {
    let shoes = category(1, "Shoes");
    let hats = category(2, "Hats");
    FakeCatalog::new()
        .with_categories(vec![shoes.clone(), hats.clone()])
        .with_products(vec![
            product(1, "Red shoes", Some(&shoes)),
            product(2, "Blue shoes", Some(&shoes)),
            product(3, "Sun hat", Some(&hats)),
        ])
}

/// A user holding `roles`.
#[must_use]
pub fn user_with_roles(roles: &[&str]) -> User {
    User::new(UserId::new(7), "Aina")
        .with_email("aina@example.com")
        .with_roles(roles.iter().copied())
}

/// A session store already logged in as `user`.
///
/// # Panics
///
/// Panics if the storage rejects the write.
#[must_use]
pub fn logged_in<S: Storage>(storage: S, user: User) -> SessionStore<S> {
    let mut session = SessionStore::load(storage).expect("load session");
    session
        .login(SecretString::from("fake-token"), user)
        .expect("store session");
    session
}

/// App state over `api` with a logged-in in-memory session.
///
/// # Panics
///
/// Panics if the test config cannot be built.
#[must_use]
pub fn app_state(api: FakeCatalog, user: User) -> AppState<FakeCatalog, Arc<MemoryStorage>> {
    let config = AdminConfig::with_api_url("http://localhost:8000/api/v1", "unused.json")
        .expect("test config");
    let session = logged_in(Arc::new(MemoryStorage::new()), user);
    AppState::from_parts(config, Arc::new(api), session)
}
