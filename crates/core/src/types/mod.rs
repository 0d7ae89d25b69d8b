//! Core types for the catalog admin.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod role;
pub mod user;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::{Category, NewProduct, Product, ProductQuery};
pub use role::{Role, RoleRef, permissions};
pub use user::User;
