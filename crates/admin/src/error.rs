//! Unified error handling for the catalog admin.
//!
//! Every failure maps onto one [`ErrorKind`], which decides how a front-end
//! presents it. Transport failures get generic text, backend errors show
//! the backend's message, validation failures are shown inline,
//! authorization failures become a notice, and an invalid session sends the
//! user back to login.

use thiserror::Error;

use crate::catalog::ApiError;
use crate::config::ConfigError;
use crate::services::session::SessionError;
use crate::storage::StorageError;
use crate::views::product_form::{FormError, failure_message};

/// Generic text for transport failures.
pub const NETWORK_FAILURE: &str = "Could not reach the catalog service. Please try again.";

/// Fallback for a backend error that carries no message.
pub const SERVER_FAILURE: &str = "The catalog service could not complete the request.";

/// Text shown when the session is missing or rejected.
pub const SESSION_EXPIRED: &str = "Session expired, please log in.";

/// How an error is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure; logged, shown as generic text.
    Network,
    /// The backend answered with an error status; its message is shown.
    Server,
    /// Bad input; shown inline.
    Validation,
    /// Missing permission; shown as a notice.
    Authorization,
    /// No valid session; back to login.
    Unauthenticated,
    /// Local failure (config, storage, decoding).
    Internal,
}

/// Application-level error type for the catalog admin.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A command that needs a session was run without one.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The user lacks the permission an action needs.
    #[error("{0}")]
    NotPermitted(&'static str),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The presentation class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(e) | Self::Session(SessionError::Api(e)) | Self::Form(FormError::Api(e)) => {
                api_kind(e)
            }
            Self::Form(FormError::NotPermitted) | Self::NotPermitted(_) => ErrorKind::Authorization,
            Self::Form(_) => ErrorKind::Validation,
            Self::NotAuthenticated => ErrorKind::Unauthenticated,
            Self::Config(_) | Self::Session(_) | Self::Storage(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the session should be dropped and the user sent to login.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthenticated)
    }

    /// The message a front-end shows for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match (self.kind(), self) {
            (ErrorKind::Network, _) => NETWORK_FAILURE.to_owned(),
            (ErrorKind::Unauthenticated, _) => SESSION_EXPIRED.to_owned(),
            (_, Self::Form(FormError::Api(e))) => failure_message(e),
            (_, Self::Api(ApiError::Validation { errors, message })) => {
                if errors.is_empty() {
                    message.clone().unwrap_or_else(|| self.to_string())
                } else {
                    errors.joined()
                }
            }
            (ErrorKind::Server, Self::Api(e) | Self::Session(SessionError::Api(e))) => e
                .backend_message()
                .map_or_else(|| SERVER_FAILURE.to_owned(), str::to_owned),
            _ => self.to_string(),
        }
    }
}

const fn api_kind(error: &ApiError) -> ErrorKind {
    match error {
        ApiError::Http(_) => ErrorKind::Network,
        ApiError::Api { .. } => ErrorKind::Server,
        ApiError::Unauthenticated => ErrorKind::Unauthenticated,
        ApiError::Forbidden(_) => ErrorKind::Authorization,
        ApiError::InvalidCredentials(_) | ApiError::Validation { .. } | ApiError::NotFound(_) => {
            ErrorKind::Validation
        }
        ApiError::Parse(_) | ApiError::Url(_) => ErrorKind::Internal,
    }
}

/// Set the Sentry user context for the logged-in user.
pub fn set_sentry_user(user_id: i64, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
