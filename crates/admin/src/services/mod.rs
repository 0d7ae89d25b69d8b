//! Business logic services for the catalog admin.
//!
//! # Services
//!
//! - `auth` - Permission and role resolution for the current user
//! - `session` - The persisted login session

pub mod auth;
pub mod session;

pub use auth::{Authorizer, ProductCapabilities};
pub use session::{SessionError, SessionStore};
