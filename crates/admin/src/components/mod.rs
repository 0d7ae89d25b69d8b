//! Reusable presentation components.

pub mod data_table;

pub use data_table::{DataTableConfig, products_table_config, render_product_list};
