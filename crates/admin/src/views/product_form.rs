//! Product creation form.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use catalog_core::{NewProduct, Price, PriceError, Product};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{ApiError, CatalogApi, PhotoUpload};
use crate::services::auth::ProductCapabilities;

/// Largest photo accepted for upload (10 MiB).
pub const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

/// Message shown when a create fails without a usable backend message.
pub const CREATE_FAILED: &str = "Failed to create product";

/// Notice shown instead of the form to users without `products-create`.
pub const CREATE_NOT_PERMITTED: &str = "You do not have permission to create products.";

/// Errors from the product form.
#[derive(Debug, Error)]
pub enum FormError {
    /// The user may not create products.
    #[error("{}", CREATE_NOT_PERMITTED)]
    NotPermitted,

    /// A submission from this form is still in flight.
    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("name is required")]
    MissingName,

    #[error(transparent)]
    InvalidPrice(#[from] PriceError),

    #[error("stock must be a whole number of at least 0")]
    InvalidStock,

    /// The chosen photo exceeds [`MAX_PHOTO_BYTES`].
    #[error("photo is {size} bytes; the limit is {max} bytes", max = MAX_PHOTO_BYTES)]
    PhotoTooLarge { size: u64 },

    /// The chosen photo could not be read.
    #[error("could not read photo: {0}")]
    Photo(#[from] std::io::Error),

    /// The backend rejected the create.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormFields {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl ProductFormFields {
    /// Validate the input into a create request.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field: a blank name, a missing, non-numeric
    /// or negative price, or a stock that is not a non-negative integer.
    pub fn validate(&self) -> Result<NewProduct, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let price = Price::parse(&self.price)?;
        let stock = match self.stock.trim() {
            "" => 0,
            stock => stock.parse::<u32>().map_err(|_| FormError::InvalidStock)?,
        };
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        Ok(NewProduct {
            name: name.to_owned(),
            description,
            price,
            stock,
        })
    }
}

/// The message a front-end shows for a failed create.
///
/// Field errors are flattened in order and joined with `", "`. Otherwise the
/// backend's message is used, falling back to [`CREATE_FAILED`].
#[must_use]
pub fn failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Validation { errors, .. } if !errors.is_empty() => errors.joined(),
        other => other
            .backend_message()
            .map_or_else(|| CREATE_FAILED.to_owned(), str::to_owned),
    }
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type CreatedCallback = Box<dyn Fn(Option<&Product>) + Send + Sync>;

/// Controller for the create-product form.
///
/// At most one submission per form is in flight. On success the fields are
/// reset and the `on_created` callback fires so the owner can refresh the list.
pub struct ProductForm<A> {
    api: Arc<A>,
    token: SecretString,
    fields: ProductFormFields,
    photo: Option<PhotoUpload>,
    error: Option<String>,
    submitting: Arc<AtomicBool>,
    on_created: Option<CreatedCallback>,
}

impl<A> std::fmt::Debug for ProductForm<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductForm")
            .field("fields", &self.fields)
            .field("photo", &self.photo.as_ref().map(|p| &p.file_name))
            .field("error", &self.error)
            .field("submitting", &self.submitting.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<A: CatalogApi> ProductForm<A> {
    /// A blank form.
    ///
    /// # Errors
    ///
    /// Returns `FormError::NotPermitted` if the user cannot create products.
    pub fn new(
        api: Arc<A>,
        token: SecretString,
        capabilities: ProductCapabilities,
    ) -> Result<Self, FormError> {
        if !capabilities.create {
            return Err(FormError::NotPermitted);
        }
        Ok(Self {
            api,
            token,
            fields: ProductFormFields::default(),
            photo: None,
            error: None,
            submitting: Arc::new(AtomicBool::new(false)),
            on_created: None,
        })
    }

    /// Call `callback` after every successful create, with the product when
    /// the backend returned one.
    #[must_use]
    pub fn on_created(
        mut self,
        callback: impl Fn(Option<&Product>) + Send + Sync + 'static,
    ) -> Self {
        self.on_created = Some(Box::new(callback));
        self
    }

    /// The current input.
    #[must_use]
    pub const fn fields(&self) -> &ProductFormFields {
        &self.fields
    }

    /// Edit the input.
    pub const fn fields_mut(&mut self) -> &mut ProductFormFields {
        &mut self.fields
    }

    /// Replace all input at once.
    pub fn set_fields(&mut self, fields: ProductFormFields) {
        self.fields = fields;
    }

    /// The attached photo.
    #[must_use]
    pub const fn photo(&self) -> Option<&PhotoUpload> {
        self.photo.as_ref()
    }

    /// The message from the last failed submission.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Attach a photo.
    ///
    /// The size is checked before the file is read; an oversized file leaves
    /// any previous attachment in place.
    ///
    /// # Errors
    ///
    /// Returns `FormError::PhotoTooLarge` above [`MAX_PHOTO_BYTES`], or
    /// `FormError::Photo` if the file cannot be read.
    pub async fn attach_photo(&mut self, path: &Path) -> Result<(), FormError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_PHOTO_BYTES {
            warn!(path = %path.display(), size, "Photo rejected, too large");
            return Err(FormError::PhotoTooLarge { size });
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "photo".to_owned(), |n| n.to_string_lossy().into_owned());
        self.attach_photo_bytes(file_name, bytes)
    }

    /// Attach a photo already in memory.
    ///
    /// # Errors
    ///
    /// Returns `FormError::PhotoTooLarge` above [`MAX_PHOTO_BYTES`].
    pub fn attach_photo_bytes(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), FormError> {
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if size > MAX_PHOTO_BYTES {
            return Err(FormError::PhotoTooLarge { size });
        }
        let file_name = file_name.into();
        debug!(file_name = %file_name, size, "Photo attached");
        self.photo = Some(PhotoUpload { file_name, bytes });
        Ok(())
    }

    /// Remove the attached photo.
    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    /// Clear every field, the attachment, and the error.
    pub fn reset(&mut self) {
        self.fields = ProductFormFields::default();
        self.photo = None;
        self.error = None;
    }

    /// Validate and submit the form.
    ///
    /// On failure the form keeps its input and [`error`](Self::error) holds
    /// the message to display. A success yields the created product, or
    /// `None` when the backend accepted the create without returning it.
    ///
    /// # Errors
    ///
    /// Returns `FormError::AlreadySubmitting` while another submission is in
    /// flight, a validation error for bad input, or `FormError::Api` if the
    /// backend rejects the product.
    #[instrument(skip(self), fields(name = %self.fields.name))]
    pub async fn submit(&mut self) -> Result<Option<Product>, FormError> {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return Err(FormError::AlreadySubmitting);
        };
        self.error = None;

        let product = match self.fields.validate() {
            Ok(product) => product,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        match self
            .api
            .create_product(&self.token, &product, self.photo.as_ref())
            .await
        {
            Ok(created) => {
                info!(product_id = ?created.as_ref().map(|p| p.id), "Product created");
                self.reset();
                if let Some(callback) = &self.on_created {
                    callback(created.as_ref());
                }
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, "Product create failed");
                self.error = Some(failure_message(&e));
                Err(FormError::Api(e))
            }
        }
    }

    /// A handle that observes whether this form is submitting.
    #[must_use]
    pub fn submitting_flag(&self) -> SubmittingFlag {
        SubmittingFlag(Arc::clone(&self.submitting))
    }
}

/// Read-only view of a form's in-flight flag, usable from another task.
#[derive(Debug, Clone)]
pub struct SubmittingFlag(Arc<AtomicBool>);

impl SubmittingFlag {
    /// Whether the form is submitting.
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
