//! Catalog admin library.
//!
//! Everything a catalog administration front-end needs apart from the
//! terminal itself: the REST client, the persisted session, permission
//! checks, and the list and form controllers.
//!
//! # Layout
//!
//! - [`catalog`] - Backend client behind the [`catalog::CatalogApi`] trait
//! - [`services`] - Session store and permission resolution
//! - [`views`] - Product list, product form, and dashboard controllers
//! - [`components`] - Table rendering
//! - [`storage`] - Persisted key-value state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod components;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod views;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{AppError, ErrorKind};
pub use state::AppState;
