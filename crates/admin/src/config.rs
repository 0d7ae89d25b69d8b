//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `CATALOG_API_URL` - Backend base URL (default: `http://localhost:8000/api/v1`)
//! - `CATALOG_SESSION_FILE` - Persisted session file
//!   (default: `$HOME/.catalog-admin/session.json`)
//! - `CATALOG_SEARCH_DEBOUNCE_MS` - Quiet period before search input applies (default: 500)
//! - `CATALOG_HTTP_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default search debounce window.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const SESSION_DIR: &str = ".catalog-admin";
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog admin client configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Backend base URL, always ending in `/`
    pub api_url: Url,
    /// Where the session token and user are persisted
    pub session_file: PathBuf,
    /// Quiet period before typed search input becomes the effective filter
    pub search_debounce: Duration,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value,
    /// or if no session file is configured and `HOME` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("CATALOG_API_URL", DEFAULT_API_URL))?;
        let session_file = match get_optional_env("CATALOG_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };
        let search_debounce = Duration::from_millis(parse_env_or(
            "CATALOG_SEARCH_DEBOUNCE_MS",
            u64::try_from(DEFAULT_SEARCH_DEBOUNCE.as_millis()).unwrap_or(500),
        )?);
        let http_timeout = Duration::from_secs(parse_env_or(
            "CATALOG_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            api_url,
            session_file,
            search_debounce,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }

    /// Configuration pointing at `api_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not a valid URL.
    pub fn with_api_url(api_url: &str, session_file: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            session_file: session_file.into(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, normalizing it to end with `/` so relative joins
/// keep the `/api/v1` prefix.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), e.to_string()))
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::MissingEnvVar("HOME".to_string()))?;
    Ok(PathBuf::from(home).join(SESSION_DIR).join(SESSION_FILE))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a numeric environment variable, falling back to `default` when unset.
fn parse_env_or(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
