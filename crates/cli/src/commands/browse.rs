//! Interactive product browser.
//!
//! Every plain input line becomes the search box contents; the list
//! refreshes once input has been quiet for the configured debounce.
//! Lines starting with `:` are commands.

use catalog_admin::catalog::{ApiError, CatalogApi};
use catalog_admin::components::data_table::{filter_summary, render_product_list};
use catalog_admin::storage::Storage;
use catalog_admin::views::{ListSnapshot, ProductListHandle};
use catalog_admin::{AppError, AppState};
use catalog_core::{CategoryId, ProductId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{CliError, say, say_raw};

const HELP: &str = "\
Type to search. Commands:
  :cat <id>     filter by category (:cat alone shows all)
  :clear        clear search and category
  :reload       fetch again
  :delete <id>  delete a product (asks for confirmation)
  :yes / :no    answer the confirmation
  :dismiss      hide the current alert
  :help         show this help
  :quit         leave";

/// One line of browser input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    Search(String),
    Category(Option<CategoryId>),
    Clear,
    Reload,
    Delete(ProductId),
    Confirm(bool),
    Dismiss,
    Help,
    Quit,
    Invalid(String),
}

impl BrowseInput {
    /// Parse a line typed at the browser prompt.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.strip_prefix(':') else {
            return Self::Search(line.to_owned());
        };

        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default();
        let argument = words.next();
        match (name, argument) {
            ("q" | "quit", _) => Self::Quit,
            ("clear", _) => Self::Clear,
            ("reload", _) => Self::Reload,
            ("y" | "yes", _) => Self::Confirm(true),
            ("n" | "no", _) => Self::Confirm(false),
            ("dismiss", _) => Self::Dismiss,
            ("h" | "help", _) => Self::Help,
            ("cat", None) => Self::Category(None),
            ("cat", Some(id)) => id.parse().map_or_else(
                |_| Self::Invalid(format!("not a category id: {id}")),
                |id| Self::Category(Some(id)),
            ),
            ("delete", Some(id)) => id.parse().map_or_else(
                |_| Self::Invalid(format!("not a product id: {id}")),
                Self::Delete,
            ),
            ("delete", None) => Self::Invalid("usage: :delete <id>".to_owned()),
            (other, _) => Self::Invalid(format!("unknown command :{other} (try :help)")),
        }
    }
}

/// What to do after one input line.
enum Flow {
    Continue,
    Quit,
}

fn dispatch(list: &ProductListHandle, input: BrowseInput) -> Flow {
    match input {
        BrowseInput::Search(text) => list.input_search(text),
        BrowseInput::Category(id) => list.select_category(id),
        BrowseInput::Clear => list.clear_filters(),
        BrowseInput::Reload => list.reload(),
        BrowseInput::Delete(id) => list.request_delete(id),
        BrowseInput::Confirm(answer) => list.confirm_delete(answer),
        BrowseInput::Dismiss => list.dismiss_alert(),
        BrowseInput::Help => say(HELP),
        BrowseInput::Invalid(message) => say(message),
        BrowseInput::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// The full screen for one snapshot.
fn screen(snapshot: &ListSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&filter_summary(snapshot));
    out.push('\n');
    if snapshot.search_input != snapshot.filter.search_term {
        out.push_str(&format!("(searching for \"{}\"...)\n", snapshot.search_input));
    }
    out.push_str(&render_product_list(snapshot));
    if let Some(id) = snapshot.pending_delete {
        out.push_str(&format!("Delete product #{id}? Answer :yes or :no\n"));
    }
    if let Some(alert) = &snapshot.alert {
        out.push_str(&format!("! {alert}\n"));
    }
    out
}

/// Run the browser until `:quit` or end of input.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` without a session, an
/// unauthenticated error if the backend rejects the session mid-way, or a
/// terminal I/O error.
pub async fn run<A: CatalogApi, S: Storage>(state: &AppState<A, S>) -> Result<(), CliError> {
    let dashboard = state.open_dashboard()?;
    let list = dashboard.list().clone();
    let mut updates = list.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_screen = String::new();

    say(HELP);
    let outcome = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.session_expired {
                    break Err(AppError::Api(ApiError::Unauthenticated).into());
                }
                let next = screen(&snapshot);
                if next != last_screen {
                    say_raw(&next);
                    last_screen = next;
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if matches!(dispatch(&list, BrowseInput::parse(&line)), Flow::Quit) {
                            break Ok(());
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(CliError::Io(e)),
                }
            }
        }
    };

    debug!("Leaving browser");
    dashboard.close().await;
    outcome
}

#[cfg(test)]
mod tests {
    use catalog_admin::services::ProductCapabilities;
    use catalog_admin::testing::product;

    use super::*;

    #[test]
    fn test_parse_search_text() {
        assert_eq!(
            BrowseInput::parse("red shoes\n"),
            BrowseInput::Search("red shoes".into())
        );
        assert_eq!(BrowseInput::parse(""), BrowseInput::Search(String::new()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(BrowseInput::parse(":quit"), BrowseInput::Quit);
        assert_eq!(BrowseInput::parse(":q"), BrowseInput::Quit);
        assert_eq!(BrowseInput::parse(":clear"), BrowseInput::Clear);
        assert_eq!(BrowseInput::parse(":reload"), BrowseInput::Reload);
        assert_eq!(BrowseInput::parse(":yes"), BrowseInput::Confirm(true));
        assert_eq!(BrowseInput::parse(":no"), BrowseInput::Confirm(false));
        assert_eq!(BrowseInput::parse(":cat"), BrowseInput::Category(None));
        assert_eq!(
            BrowseInput::parse(":cat 4"),
            BrowseInput::Category(Some(CategoryId::new(4)))
        );
        assert_eq!(
            BrowseInput::parse(":delete 12"),
            BrowseInput::Delete(ProductId::new(12))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(BrowseInput::parse(":cat shoes"), BrowseInput::Invalid(_)));
        assert!(matches!(BrowseInput::parse(":delete"), BrowseInput::Invalid(_)));
        assert!(matches!(BrowseInput::parse(":frobnicate"), BrowseInput::Invalid(_)));
    }

    #[test]
    fn test_screen_shows_pending_delete_and_alert() {
        let snapshot = ListSnapshot {
            products: vec![product(3, "Mug", None)],
            capabilities: ProductCapabilities::all(),
            pending_delete: Some(ProductId::new(3)),
            alert: Some("Failed to delete product".into()),
            search_input: "mu".into(),
            ..ListSnapshot::default()
        };
        let text = screen(&snapshot);
        assert!(text.starts_with("Category: All categories\n"));
        assert!(text.contains("(searching for \"mu\"...)"));
        assert!(text.contains("Delete product #3? Answer :yes or :no"));
        assert!(text.contains("! Failed to delete product"));
    }
}
