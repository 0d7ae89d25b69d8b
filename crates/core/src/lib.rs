//! Catalog Core - Shared domain types.
//!
//! This crate provides the types used across the catalog admin components:
//! - `admin` - REST client, session store and view controllers
//! - `cli` - Terminal front-end for catalog administrators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persisted state. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, users, roles, products and categories

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
