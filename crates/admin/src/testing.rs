//! In-memory [`CatalogApi`] for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-support`
//! feature, for the integration tests. Records every call so tests can
//! assert on what was sent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use catalog_core::{Category, CategoryId, NewProduct, Product, ProductId, ProductQuery, User};
use secrecy::SecretString;

use crate::catalog::{ApiError, CatalogApi, Credentials, FieldErrors, LoginResponse, PhotoUpload};

/// How a create request should fail.
#[derive(Debug, Clone)]
pub enum CreateFailure {
    /// 422 with field errors.
    Validation(Vec<(String, Vec<String>)>),
    /// Non-2xx with an optional backend message.
    Status(u16, Option<String>),
}

/// A recorded create request.
#[derive(Debug, Clone)]
pub struct CreateCall {
    pub product: NewProduct,
    pub photo: Option<String>,
}

/// Scriptable in-memory catalog backend.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    products: Mutex<Vec<Product>>,
    categories: Vec<Category>,
    login_user: Option<User>,
    queries: Mutex<Vec<ProductQuery>>,
    creates: Mutex<Vec<CreateCall>>,
    deletes: Mutex<Vec<ProductId>>,
    search_delays: HashMap<String, Duration>,
    create_delay: Option<Duration>,
    bodiless_creates: bool,
    create_failure: Mutex<Option<CreateFailure>>,
    logout_calls: AtomicU32,
    fail_logout: bool,
    fail_list: AtomicBool,
    fail_delete: AtomicBool,
    token_expired: AtomicBool,
    next_id: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeCatalog {
    /// Empty catalog; logins are rejected until a user is configured.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1000),
            ..Self::default()
        }
    }

    /// Seed the product list.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        *lock(&self.products) = products;
        self
    }

    /// Seed the category list.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Accept any login as `user`.
    #[must_use]
    pub fn with_login_user(mut self, user: User) -> Self {
        self.login_user = Some(user);
        self
    }

    /// Delay the product list response for one search term.
    #[must_use]
    pub fn with_search_delay(mut self, search: &str, delay: Duration) -> Self {
        self.search_delays.insert(search.to_owned(), delay);
        self
    }

    /// Delay every create response.
    #[must_use]
    pub const fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Store creates but answer without a readable product, as a backend
    /// replying `201` with `{"message": "created"}` would.
    #[must_use]
    pub const fn with_bodiless_creates(mut self) -> Self {
        self.bodiless_creates = true;
        self
    }

    /// Make `POST /logout` fail.
    #[must_use]
    pub const fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    /// Make the next creates fail until cleared.
    pub fn fail_creates(&self, failure: Option<CreateFailure>) {
        *lock(&self.create_failure) = failure;
    }

    /// Make product list requests fail.
    pub fn fail_lists(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make deletes fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Reject every authenticated call with 401.
    pub fn expire_token(&self) {
        self.token_expired.store(true, Ordering::SeqCst);
    }

    /// Every product list query received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<ProductQuery> {
        lock(&self.queries).clone()
    }

    /// Forget recorded queries.
    pub fn clear_queries(&self) {
        lock(&self.queries).clear();
    }

    /// Every create request received.
    #[must_use]
    pub fn creates(&self) -> Vec<CreateCall> {
        lock(&self.creates).clone()
    }

    /// Every delete request received.
    #[must_use]
    pub fn deletes(&self) -> Vec<ProductId> {
        lock(&self.deletes).clone()
    }

    /// Number of logout notifications received.
    #[must_use]
    pub fn logout_calls(&self) -> u32 {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Current product ids.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        lock(&self.products).iter().map(|p| p.id).collect()
    }

    fn check_token(&self) -> Result<(), ApiError> {
        if self.token_expired.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthenticated);
        }
        Ok(())
    }
}

impl CatalogApi for FakeCatalog {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.login_user
            .clone()
            .map(|user| LoginResponse {
                token: SecretString::from("fake-token"),
                user,
            })
            .ok_or(ApiError::InvalidCredentials(None))
    }

    async fn logout(&self, _token: &SecretString) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            return Err(ApiError::Api {
                status: 503,
                message: Some("unavailable".into()),
            });
        }
        Ok(())
    }

    async fn list_products(
        &self,
        _token: &SecretString,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, ApiError> {
        lock(&self.queries).push(query.clone());
        if let Some(delay) = self.search_delays.get(&query.search) {
            tokio::time::sleep(*delay).await;
        }
        self.check_token()?;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 500,
                message: None,
            });
        }

        let needle = query.search.to_lowercase();
        Ok(lock(&self.products)
            .iter()
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .filter(|p| {
                query
                    .category_id
                    .is_none_or(|id| p.category.as_ref().is_some_and(|c| c.id == id))
            })
            .cloned()
            .collect())
    }

    async fn create_product(
        &self,
        _token: &SecretString,
        product: &NewProduct,
        photo: Option<&PhotoUpload>,
    ) -> Result<Option<Product>, ApiError> {
        lock(&self.creates).push(CreateCall {
            product: product.clone(),
            photo: photo.map(|p| p.file_name.clone()),
        });
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_token()?;

        let failure = lock(&self.create_failure).clone();
        match failure {
            Some(CreateFailure::Validation(fields)) => {
                let pairs: Vec<(&str, Vec<&str>)> = fields
                    .iter()
                    .map(|(field, messages)| {
                        (field.as_str(), messages.iter().map(String::as_str).collect())
                    })
                    .collect();
                return Err(ApiError::Validation {
                    message: Some("The given data was invalid.".into()),
                    errors: FieldErrors::from_pairs(pairs),
                });
            }
            Some(CreateFailure::Status(status, message)) => {
                return Err(ApiError::Api { status, message });
            }
            None => {}
        }

        let id = ProductId::new(i64::from(self.next_id.fetch_add(1, Ordering::SeqCst)));
        let created = Product {
            id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: i64::from(product.stock),
            category: None,
            photo: photo.map(|p| format!("/storage/products/{}", p.file_name)),
            created_at: None,
        };
        lock(&self.products).push(created.clone());
        Ok((!self.bodiless_creates).then_some(created))
    }

    async fn delete_product(&self, _token: &SecretString, id: ProductId) -> Result<(), ApiError> {
        lock(&self.deletes).push(id);
        self.check_token()?;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 500,
                message: Some("Server Error".into()),
            });
        }
        let mut products = lock(&self.products);
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(ApiError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    async fn list_categories(&self, _token: &SecretString) -> Result<Vec<Category>, ApiError> {
        self.check_token()?;
        Ok(self.categories.clone())
    }
}

/// A product fixture.
#[must_use]
pub fn product(id: i64, name: &str, category: Option<&Category>) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: None,
        price: catalog_core::Price::ZERO,
        stock: 0,
        category: category.cloned(),
        photo: None,
        created_at: None,
    }
}

/// A category fixture.
#[must_use]
pub fn category(id: i64, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_owned(),
    }
}
