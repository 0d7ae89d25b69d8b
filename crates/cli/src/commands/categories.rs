//! Category commands.

use catalog_admin::catalog::CatalogApi;
use catalog_admin::components::DataTableConfig;
use catalog_admin::components::data_table::TableColumn;
use catalog_admin::storage::Storage;
use catalog_admin::{AppError, AppState};
use catalog_core::Category;

use super::{CliError, say};

/// Print every category.
///
/// # Errors
///
/// Returns an error if nobody is logged in or the request fails.
pub async fn list<A: CatalogApi, S: Storage>(state: &AppState<A, S>) -> Result<(), CliError> {
    let categories = state
        .api()
        .list_categories(state.token()?)
        .await
        .map_err(AppError::from)?;
    say(render_categories(&categories));
    Ok(())
}

fn render_categories(categories: &[Category]) -> String {
    let config = DataTableConfig::new()
        .column(TableColumn::new("id", "ID"))
        .column(TableColumn::new("name", "Name"))
        .empty_state("No categories found.", "Loading categories...");
    if categories.is_empty() {
        return config.empty_title;
    }
    let rows: Vec<Vec<String>> = categories
        .iter()
        .map(|c| vec![c.id.to_string(), c.name.clone()])
        .collect();
    config.render_rows(&rows).trim_end().to_owned()
}
