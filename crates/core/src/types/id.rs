//! Backend record ids.
//!
//! Users, products and categories are all numbered by the backend. Each
//! gets its own id type so a category id cannot reach `DELETE /products/{id}`.

/// Declares an id type wrapping the backend's integer key.
///
/// The type serializes as the bare number, displays as it (for URL paths
/// and query strings) and parses from CLI arguments with surrounding
/// whitespace ignored.
///
/// ```rust
/// use catalog_core::{CategoryId, ProductId};
///
/// let product = ProductId::new(12);
/// let category: CategoryId = " 7 ".parse().unwrap();
/// assert_eq!(format!("products/{product}"), "products/12");
/// assert_eq!(category.as_i64(), 7);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a backend key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The backend key.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CategoryId);
