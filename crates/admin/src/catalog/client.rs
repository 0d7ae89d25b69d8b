//! `reqwest` implementation of [`CatalogApi`].

use catalog_core::{Category, NewProduct, Product, ProductId, ProductQuery};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::ApiError;
use super::types::{Credentials, ErrorBody, ItemEnvelope, ListEnvelope, LoginResponse, PhotoUpload};
use super::CatalogApi;
use crate::config::AdminConfig;

/// Catalog backend client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    /// HTTP client.
    client: Client,
    /// Base URL ending in `/`, e.g. `http://localhost:8000/api/v1/`.
    base_url: Url,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &AdminConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self::with_http_client(config.api_url.clone(), client))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub const fn with_http_client(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }

    /// The backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Build the `GET /products` URL, adding only non-empty filters.
    fn products_url(&self, query: &ProductQuery) -> Result<Url, ApiError> {
        let mut url = self.endpoint("products")?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in &pairs {
                serializer.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Checks HTTP response status; returns the response on success or a
    /// classified error built from the backend's error body.
    async fn ensure_success(
        response: Response,
        operation: &'static str,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        warn!(
            operation,
            status = status.as_u16(),
            message = ?body.message,
            "Catalog API request failed"
        );

        Err(classify_error(status, body, text))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn login_request(&self, credentials: &Credentials) -> Result<RequestBuilder, ApiError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        Ok(self.client.post(self.endpoint("login")?).json(&body))
    }

    fn logout_request(&self, token: &SecretString) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .post(self.endpoint("logout")?)
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({})))
    }

    fn list_products_request(
        &self,
        token: &SecretString,
        query: &ProductQuery,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .get(self.products_url(query)?)
            .bearer_auth(token.expose_secret()))
    }

    /// JSON body without a photo, multipart with one.
    fn create_product_request(
        &self,
        token: &SecretString,
        product: &NewProduct,
        photo: Option<&PhotoUpload>,
    ) -> Result<RequestBuilder, ApiError> {
        let request = self
            .client
            .post(self.endpoint("products")?)
            .bearer_auth(token.expose_secret());
        Ok(match photo {
            Some(photo) => request.multipart(multipart_form(product, photo)),
            None => request.json(product),
        })
    }

    fn delete_product_request(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .delete(self.endpoint(&format!("products/{id}"))?)
            .bearer_auth(token.expose_secret()))
    }

    fn list_categories_request(&self, token: &SecretString) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .get(self.endpoint("categories")?)
            .bearer_auth(token.expose_secret()))
    }
}

/// Map a failed response onto [`ApiError`].
fn classify_error(status: StatusCode, body: ErrorBody, raw: String) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthenticated;
    }
    if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
        return ApiError::Validation {
            message: body.message,
            errors,
        };
    }
    match status {
        StatusCode::FORBIDDEN => ApiError::Forbidden(body.message),
        StatusCode::NOT_FOUND => ApiError::NotFound(body.message.unwrap_or(raw)),
        _ => ApiError::Api {
            status: status.as_u16(),
            message: body.message,
        },
    }
}

/// Rejections from `POST /login` mean bad credentials, not an expired session.
fn login_error(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthenticated => ApiError::InvalidCredentials(None),
        ApiError::Validation { message, errors } => {
            ApiError::InvalidCredentials(message.or_else(|| Some(errors.joined())))
        }
        other => other,
    }
}

/// Decode the body of a successful create.
///
/// The product already exists once the backend answers 2xx, so a body that
/// is not a product is logged and dropped rather than reported as a failure.
fn decode_created(text: &str) -> Option<Product> {
    match serde_json::from_str::<ItemEnvelope<Product>>(text) {
        Ok(envelope) => Some(envelope.into_inner()),
        Err(e) => {
            warn!(error = %e, "Create succeeded but the response is not a product");
            None
        }
    }
}

/// Text fields of a multipart create. A blank description is left out.
fn multipart_fields(product: &NewProduct) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("name", product.name.clone()),
        ("price", product.price.amount().to_string()),
        ("stock", product.stock.to_string()),
    ];
    if let Some(description) = &product.description {
        fields.push(("description", description.clone()));
    }
    fields
}

/// Multipart form for a create request with a photo attached.
fn multipart_form(product: &NewProduct, photo: &PhotoUpload) -> Form {
    multipart_fields(product)
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
        .part(
            "photo",
            Part::bytes(photo.bytes.clone()).file_name(photo.file_name.clone()),
        )
}

impl CatalogApi for CatalogClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let response = self.login_request(credentials)?.send().await?;
        let response = Self::ensure_success(response, "login")
            .await
            .map_err(login_error)?;

        let login: LoginResponse = Self::decode(response).await?;
        debug!(user_id = %login.user.id, "Logged in");
        Ok(login)
    }

    #[instrument(skip(self, token))]
    async fn logout(&self, token: &SecretString) -> Result<(), ApiError> {
        let response = self.logout_request(token)?.send().await?;

        Self::ensure_success(response, "logout").await?;
        debug!("Logout acknowledged by backend");
        Ok(())
    }

    #[instrument(skip(self, token), fields(search = %query.search, category_id = ?query.category_id))]
    async fn list_products(
        &self,
        token: &SecretString,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, ApiError> {
        let response = self.list_products_request(token, query)?.send().await?;

        let response = Self::ensure_success(response, "list products").await?;
        let products = Self::decode::<ListEnvelope<Product>>(response)
            .await?
            .into_inner();
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self, token, product, photo), fields(name = %product.name, has_photo = photo.is_some()))]
    async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
        photo: Option<&PhotoUpload>,
    ) -> Result<Option<Product>, ApiError> {
        let request = self.create_product_request(token, product, photo)?;
        let response = Self::ensure_success(request.send().await?, "create product").await?;
        let text = response.text().await.unwrap_or_default();
        let created = decode_created(&text);
        debug!(product_id = ?created.as_ref().map(|p| p.id), "Product created");
        Ok(created)
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<(), ApiError> {
        let response = self.delete_product_request(token, id)?.send().await?;

        Self::ensure_success(response, "delete product").await?;
        debug!("Product deleted");
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn list_categories(&self, token: &SecretString) -> Result<Vec<Category>, ApiError> {
        let response = self.list_categories_request(token)?.send().await?;

        let response = Self::ensure_success(response, "list categories").await?;
        let categories = Self::decode::<ListEnvelope<Category>>(response)
            .await?
            .into_inner();
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }
}
