//! Catalog backend errors.

use thiserror::Error;

use super::types::FieldErrors;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Login was rejected.
    #[error("Invalid credentials: {}", .0.as_deref().unwrap_or("login rejected"))]
    InvalidCredentials(Option<String>),

    /// The bearer token is missing, expired, or revoked.
    #[error("Session expired or invalid")]
    Unauthenticated,

    /// The user lacks permission for this operation.
    #[error("Forbidden: {}", .0.as_deref().unwrap_or("insufficient permissions"))]
    Forbidden(Option<String>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request with field-level errors.
    #[error("Validation failed: {}", .errors.joined())]
    Validation {
        /// Summary message, if the backend sent one.
        message: Option<String>,
        /// Per-field messages.
        errors: FieldErrors,
    },

    /// Any other non-2xx response.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message, if any.
        message: Option<String>,
    },
}

impl ApiError {
    /// The human-readable message the backend attached to this error, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials(message) | Self::Forbidden(message) => message.as_deref(),
            Self::Validation { message, .. } | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether this is a transport-level failure.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_messages() {
        let err = ApiError::Validation {
            message: Some("The given data was invalid.".into()),
            errors: FieldErrors::from_pairs([("name", vec!["required"])]),
        };
        assert_eq!(err.to_string(), "Validation failed: required");
        assert_eq!(err.backend_message(), Some("The given data was invalid."));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "API error (500): no details");
        assert!(!err.is_network());
    }
}
