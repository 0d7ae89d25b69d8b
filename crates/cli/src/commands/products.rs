//! One-shot product commands.
//!
//! # Usage
//!
//! ```bash
//! catalog products list --search shoes --category 2
//! catalog products create --name "Canvas tote" --price 12.50 --stock 4 --photo tote.jpg
//! catalog products delete 17 --yes
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use catalog_admin::catalog::CatalogApi;
use catalog_admin::components::data_table::{product_cells, products_table_config};
use catalog_admin::services::ProductCapabilities;
use catalog_admin::storage::Storage;
use catalog_admin::views::product_list::DELETE_NOT_PERMITTED;
use catalog_admin::views::{ProductForm, ProductFormFields};
use catalog_admin::{AppError, AppState};
use catalog_core::{CategoryId, Product, ProductId, ProductQuery};
use tracing::info;

use super::{CliError, is_yes, prompt, say};

/// Arguments for `products create`.
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub stock: Option<String>,
    pub photo: Option<PathBuf>,
}

/// Print the products matching the filters.
///
/// # Errors
///
/// Returns an error if nobody is logged in or the request fails.
pub async fn list<A: CatalogApi, S: Storage>(
    state: &AppState<A, S>,
    search: Option<String>,
    category: Option<CategoryId>,
) -> Result<(), CliError> {
    let query = ProductQuery::new(search.unwrap_or_default(), category);
    let products = state
        .api()
        .list_products(state.token()?, &query)
        .await
        .map_err(AppError::from)?;

    let capabilities = state.session().authorizer().product_capabilities();
    say(render_products(&products, capabilities));
    Ok(())
}

fn render_products(products: &[Product], capabilities: ProductCapabilities) -> String {
    let config = products_table_config(capabilities, &[]);
    if products.is_empty() {
        return config.empty_title;
    }
    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| product_cells(p, capabilities))
        .collect();
    config.render_rows(&rows).trim_end().to_owned()
}

/// Create a product through the form controller.
///
/// # Errors
///
/// Returns an authorization error without `products-create`, a validation
/// error for bad input, or the backend's error.
pub async fn create<A: CatalogApi, S: Storage>(
    state: &AppState<A, S>,
    args: CreateArgs,
) -> Result<(), CliError> {
    let token = state.token()?.clone();
    let capabilities = state.session().authorizer().product_capabilities();
    let mut form = ProductForm::new(Arc::clone(state.api()), token, capabilities)
        .map_err(AppError::from)?;

    form.set_fields(ProductFormFields {
        name: args.name,
        description: args.description.unwrap_or_default(),
        price: args.price,
        stock: args.stock.unwrap_or_default(),
    });
    if let Some(path) = &args.photo {
        form.attach_photo(path).await.map_err(AppError::from)?;
    }

    match form.submit().await.map_err(AppError::from)? {
        Some(created) => {
            info!(product_id = %created.id, "Created product");
            say(format!("Created product #{} {}", created.id, created.name));
        }
        None => say("Product created"),
    }
    Ok(())
}

/// Delete a product after confirmation.
///
/// # Errors
///
/// Returns an authorization error without `products-delete`, or the
/// backend's error.
pub async fn delete<A: CatalogApi, S: Storage>(
    state: &AppState<A, S>,
    id: ProductId,
    assume_yes: bool,
) -> Result<(), CliError> {
    let token = state.token()?;
    if !state.session().authorizer().product_capabilities().delete {
        return Err(AppError::NotPermitted(DELETE_NOT_PERMITTED).into());
    }

    if !assume_yes {
        let answer = prompt(&format!("Delete product #{id}? [y/N] ")).await?;
        if !is_yes(&answer) {
            say("Cancelled");
            return Ok(());
        }
    }

    state
        .api()
        .delete_product(token, id)
        .await
        .map_err(AppError::from)?;
    say(format!("Deleted product #{id}"));
    Ok(())
}
