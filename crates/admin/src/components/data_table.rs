//! Data table component types.
//!
//! A table is described by a [`DataTableConfig`] (columns, filters, empty
//! and loading text) and rendered as fixed-width text. Filters render as a
//! one-line summary of their current values.

use std::fmt::Write as _;

use catalog_core::{Category, Product};

use crate::services::auth::ProductCapabilities;
use crate::views::product_list::ListSnapshot;

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
}

impl TableColumn {
    /// Create a new column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Free-text input.
    Text,
    /// Single-select list.
    Select,
}

/// Filter definition for a data table.
#[derive(Debug, Clone)]
pub struct TableFilter {
    /// Query parameter the filter drives.
    pub key: String,
    pub label: String,
    pub filter_type: FilterType,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
}

/// Option for select filters.
#[derive(Debug, Clone)]
pub struct FilterOption {
    /// Query parameter value; empty means unfiltered.
    pub value: String,
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            options,
        }
    }

    /// `Label: value` for the current `value`, or `None` for an empty text
    /// filter. Select values show their option label; values with no
    /// matching option show as `#value`.
    #[must_use]
    pub fn describe(&self, value: &str) -> Option<String> {
        match self.filter_type {
            FilterType::Text if value.is_empty() => None,
            FilterType::Text => Some(format!("{}: \"{value}\"", self.label)),
            FilterType::Select => {
                let shown = self
                    .options
                    .iter()
                    .find(|o| o.value == value)
                    .map_or_else(|| format!("#{value}"), |o| o.label.clone());
                Some(format!("{}: {shown}", self.label))
            }
        }
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    /// Shown instead of the table when there are no rows.
    pub empty_title: String,
    /// Shown while the first page of rows is loading.
    pub loading_title: String,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            columns: vec![],
            filters: vec![],
            empty_title: "No items found".to_string(),
            loading_title: "Loading...".to_string(),
        }
    }
}

impl DataTableConfig {
    /// Create an empty table configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the empty and loading text.
    #[must_use]
    pub fn empty_state(mut self, empty: &str, loading: &str) -> Self {
        self.empty_title = empty.to_string();
        self.loading_title = loading.to_string();
        self
    }

    /// Whether a column with `key` exists.
    #[must_use]
    pub fn has_column(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key)
    }

    /// Summarize the filters, looking up each current value by filter key.
    #[must_use]
    pub fn describe_filters(&self, value_of: impl Fn(&str) -> String) -> String {
        self.filters
            .iter()
            .filter_map(|f| f.describe(&value_of(&f.key)))
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Render rows (one cell per column) as an aligned text table.
    #[must_use]
    pub fn render_rows(&self, rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.label.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.label.as_str()).collect();
        push_line(&mut out, &widths, header.iter().copied());
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &widths, rule.iter().map(String::as_str));
        for row in rows {
            push_line(&mut out, &widths, row.iter().map(String::as_str));
        }
        out
    }
}

fn push_line<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Build the products table configuration.
///
/// The Actions column exists only for users who may edit or delete.
#[must_use]
pub fn products_table_config(
    capabilities: ProductCapabilities,
    categories: &[Category],
) -> DataTableConfig {
    let mut options = vec![FilterOption::new("", "All categories")];
    options.extend(
        categories
            .iter()
            .map(|c| FilterOption::new(&c.id.to_string(), &c.name)),
    );

    let config = DataTableConfig::new()
        .column(TableColumn::new("id", "ID"))
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("description", "Description"))
        .column(TableColumn::new("price", "Price"))
        .column(TableColumn::new("stock", "Stock"))
        .column(TableColumn::new("photo", "Photo"))
        .filter(TableFilter::text("search", "Search"))
        .filter(TableFilter::select("category_id", "Category", options))
        .empty_state("No products found.", "Loading products...");

    if capabilities.shows_actions() {
        config.column(TableColumn::new("actions", "Actions"))
    } else {
        config
    }
}

/// Cells for one product row, matching [`products_table_config`].
#[must_use]
pub fn product_cells(product: &Product, capabilities: ProductCapabilities) -> Vec<String> {
    let mut cells = vec![
        product.id.to_string(),
        product.name.clone(),
        product
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("-")
            .to_owned(),
        product.price.to_string(),
        product.stock.to_string(),
        product.photo.clone().unwrap_or_else(|| "No photo".to_owned()),
    ];
    if capabilities.shows_actions() {
        let actions: Vec<&str> = [
            capabilities.update.then_some("Edit"),
            capabilities.delete.then_some("Delete"),
        ]
        .into_iter()
        .flatten()
        .collect();
        cells.push(actions.join(" "));
    }
    cells
}

/// Render the product list as the front-end shows it.
#[must_use]
pub fn render_product_list(snapshot: &ListSnapshot) -> String {
    let config = products_table_config(snapshot.capabilities, &snapshot.categories);
    if snapshot.products.is_empty() {
        let title = if snapshot.is_loading() {
            &config.loading_title
        } else {
            &config.empty_title
        };
        return format!("{title}\n");
    }
    let rows: Vec<Vec<String>> = snapshot
        .products
        .iter()
        .map(|p| product_cells(p, snapshot.capabilities))
        .collect();
    config.render_rows(&rows)
}

/// One-line description of the active filters.
#[must_use]
pub fn filter_summary(snapshot: &ListSnapshot) -> String {
    let config = products_table_config(snapshot.capabilities, &snapshot.categories);
    config.describe_filters(|key| match key {
        "search" => snapshot.filter.search_term.clone(),
        "category_id" => snapshot
            .filter
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    })
}
