//! Request and response types for the catalog backend.

use catalog_core::User;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Login form credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful `POST /login` response.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Deserialize)]
#[serde(from = "RawLoginResponse")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: SecretString,
    /// The authenticated user.
    pub user: User,
}

#[derive(Deserialize)]
struct RawLoginResponse {
    #[serde(alias = "access_token")]
    token: String,
    user: User,
}

impl From<RawLoginResponse> for LoginResponse {
    fn from(raw: RawLoginResponse) -> Self {
        Self {
            token: SecretString::from(raw.token),
            user: raw.user,
        }
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// A photo read from disk, ready for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// File name sent in the multipart part.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    #[serde(default)]
    pub message: Option<String>,
    /// Field-level validation errors.
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

/// Field-level validation errors: field name to one or more messages.
///
/// Fields keep the order the backend sent them in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Map<String, Value>);

impl FieldErrors {
    /// Build from `(field, messages)` pairs.
    #[must_use]
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(field, messages)| {
                    let messages = messages.into_iter().map(Value::from).collect();
                    (field.to_owned(), Value::Array(messages))
                })
                .collect(),
        )
    }

    /// Every message across all fields, in order.
    ///
    /// A field may carry a list of strings or a single string.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().flat_map(|value| match value {
            Value::String(message) => vec![message.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        })
    }

    /// Messages for one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Vec<&str> {
        match self.0.get(name) {
            Some(Value::String(message)) => vec![message.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// All messages flattened into one display string.
    #[must_use]
    pub fn joined(&self) -> String {
        self.messages().collect::<Vec<_>>().join(", ")
    }

    /// Whether no field carries an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages().next().is_none()
    }
}

/// List endpoints answer `{ "data": [...] }`; some deployments answer a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_inner(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Single-resource responses, with or without a `data` wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}
