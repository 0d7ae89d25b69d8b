//! Products, categories, and the product list query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// A product as returned by `GET /products`.
///
/// Server-owned; the client only ever holds a read-only copy from the
/// latest list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    #[serde(default)]
    pub stock: i64,
    /// Category, when the backend embeds it.
    #[serde(default)]
    pub category: Option<Category>,
    /// Public URL of the product photo.
    #[serde(default)]
    pub photo: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A validated create request for `POST /products`.
///
/// The photo attachment travels separately since it is read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    /// Product name (non-empty).
    pub name: String,
    /// Optional description; `None` when the field was left blank.
    pub description: Option<String>,
    /// Non-negative price.
    pub price: Price,
    /// Non-negative stock, `0` when the field was left blank.
    pub stock: u32,
}

/// Query parameters for `GET /products`.
///
/// Empty values are never sent: a blank search term or an unset category
/// produces no query parameter at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Free-text search term.
    pub search: String,
    /// Category filter.
    pub category_id: Option<CategoryId>,
}

impl ProductQuery {
    /// Query with both filters set.
    #[must_use]
    pub fn new(search: impl Into<String>, category_id: Option<CategoryId>) -> Self {
        Self {
            search: search.into(),
            category_id,
        }
    }

    /// Query string pairs, omitting empty filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        pairs
    }

    /// Whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.category_id.is_none()
    }
}
