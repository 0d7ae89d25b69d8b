//! Domain models for the catalog admin.

pub mod session;

pub use session::Session;
