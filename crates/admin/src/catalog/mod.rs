//! Catalog backend REST client.
//!
//! This module provides:
//! - [`CatalogApi`], the seam every view controller talks through
//! - [`CatalogClient`], the `reqwest` implementation against the real backend
//! - Request/response types and the backend's validation error shape
//!
//! # Authentication
//!
//! Every call except [`CatalogApi::login`] sends `Authorization: Bearer <token>`.
//! The client itself holds no token; callers pass the one owned by the
//! [`SessionStore`](crate::services::session::SessionStore).

mod client;
mod error;
mod types;

use std::future::Future;

use catalog_core::{Category, NewProduct, Product, ProductId, ProductQuery};
use secrecy::SecretString;

pub use client::CatalogClient;
pub use error::ApiError;
pub use types::{Credentials, ErrorBody, FieldErrors, LoginResponse, PhotoUpload};

/// Operations the admin front-end performs against the catalog backend.
///
/// Implemented by [`CatalogClient`] for real traffic and by in-memory
/// fakes in tests.
pub trait CatalogApi: Send + Sync + 'static {
    /// `POST /login` (unauthenticated).
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// `POST /logout`. The response body is ignored.
    fn logout(&self, token: &SecretString) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /products` with only the non-empty filters as query parameters.
    fn list_products(
        &self,
        token: &SecretString,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `POST /products`, as JSON or as multipart when a photo is attached.
    ///
    /// Any 2xx is a successful create. The created product is `None` when
    /// the response body does not describe one.
    fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
        photo: Option<&PhotoUpload>,
    ) -> impl Future<Output = Result<Option<Product>, ApiError>> + Send;

    /// `DELETE /products/{id}`.
    fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /categories`.
    fn list_categories(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<Category>, ApiError>> + Send;
}
