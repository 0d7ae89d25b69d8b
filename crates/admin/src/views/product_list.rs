//! Product list controller.
//!
//! Runs as its own task: commands arrive over a channel, every state change
//! is published as a [`ListSnapshot`] on a watch channel. Search input is
//! staged immediately and only becomes the effective search term after a
//! quiet period; each change of the effective filter issues exactly one
//! fetch. Every fetch carries a request id and responses to anything but
//! the latest request are dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use catalog_core::{Category, CategoryId, Product, ProductId, ProductQuery};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use secrecy::SecretString;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::catalog::{ApiError, CatalogApi};
use crate::services::auth::ProductCapabilities;

/// Alert shown when a confirmed delete fails.
pub const DELETE_FAILED: &str = "Failed to delete product";

/// Notice shown when a delete is requested without `products-delete`.
pub const DELETE_NOT_PERMITTED: &str = "You do not have permission to delete products.";

/// Where the list is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStatus {
    /// Not started.
    #[default]
    Idle,
    /// A fetch for the current filter is outstanding.
    Loading,
    /// The latest fetch succeeded.
    Ready,
    /// The latest fetch failed; the previous products are still shown.
    Errored,
}

/// The filter the product list is fetched with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Effective (debounced) search term.
    pub search_term: String,
    /// Selected category.
    pub category_id: Option<CategoryId>,
}

impl FilterState {
    /// Whether neither filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.category_id.is_none()
    }

    /// The backend query for this filter.
    #[must_use]
    pub fn query(&self) -> ProductQuery {
        ProductQuery::new(self.search_term.clone(), self.category_id)
    }
}

/// Everything a front-end needs to render the product list.
#[derive(Debug, Clone, Default)]
pub struct ListSnapshot {
    /// Progress of the latest product fetch.
    pub status: ListStatus,
    /// Products from the latest successful fetch.
    pub products: Vec<Product>,
    /// Categories for the filter dropdown, fetched once on mount.
    pub categories: Vec<Category>,
    /// Search box contents, ahead of the effective search term.
    pub search_input: String,
    /// Effective filter; every change triggers a fetch.
    pub filter: FilterState,
    /// What the user may do with products.
    pub capabilities: ProductCapabilities,
    /// Product awaiting a yes/no answer.
    pub pending_delete: Option<ProductId>,
    /// Message to show until dismissed.
    pub alert: Option<String>,
    /// The backend rejected the session token.
    pub session_expired: bool,
    /// Id of the most recently issued product fetch.
    pub latest_request: u64,
}

impl ListSnapshot {
    /// Whether a fetch for the current filter is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }
}

#[derive(Debug)]
enum Command {
    SearchInput(String),
    SelectCategory(Option<CategoryId>),
    ClearFilters,
    Reload,
    RequestDelete(ProductId),
    ConfirmDelete(bool),
    DismissAlert,
    Shutdown,
}

enum Outcome {
    Products {
        request: u64,
        result: Result<Vec<Product>, ApiError>,
    },
    Categories(Result<Vec<Category>, ApiError>),
    Deleted {
        id: ProductId,
        result: Result<(), ApiError>,
    },
}

enum Event {
    Command(Command),
    DebounceElapsed,
    Completed(Outcome),
}

/// Sends commands to a running [`ProductListController`] and reads its state.
///
/// Cheap to clone. The controller stops once every handle is dropped or
/// [`shutdown`](Self::shutdown) is called.
#[derive(Debug, Clone)]
pub struct ProductListHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ListSnapshot>,
}

impl ProductListHandle {
    /// Update the search box. The effective search follows after the quiet period.
    pub fn input_search(&self, text: impl Into<String>) {
        self.send(Command::SearchInput(text.into()));
    }

    /// Select a category, or `None` for all categories.
    pub fn select_category(&self, category_id: Option<CategoryId>) {
        self.send(Command::SelectCategory(category_id));
    }

    /// Reset search and category together.
    pub fn clear_filters(&self) {
        self.send(Command::ClearFilters);
    }

    /// Fetch again with the current filter.
    pub fn reload(&self) {
        self.send(Command::Reload);
    }

    /// Ask to delete a product; the answer comes through [`confirm_delete`](Self::confirm_delete).
    pub fn request_delete(&self, id: ProductId) {
        self.send(Command::RequestDelete(id));
    }

    /// Answer the pending delete confirmation.
    pub fn confirm_delete(&self, confirmed: bool) {
        self.send(Command::ConfirmDelete(confirmed));
    }

    /// Clear the alert.
    pub fn dismiss_alert(&self) {
        self.send(Command::DismissAlert);
    }

    /// Stop the controller. Outstanding responses are dropped.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Whether the controller task is still accepting commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// The current state.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.state.clone()
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// Returns `None` if the controller stopped first.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ListSnapshot) -> bool,
    ) -> Option<ListSnapshot> {
        let mut state = self.state.clone();
        let snapshot = state.wait_for(predicate).await.ok()?.clone();
        Some(snapshot)
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Product list controller stopped, command dropped");
        }
    }
}

/// The product list state machine.
pub struct ProductListController<A> {
    api: Arc<A>,
    token: SecretString,
    debounce: Duration,
    state: ListSnapshot,
    debounce_deadline: Option<Instant>,
    in_flight: FuturesUnordered<BoxFuture<'static, Outcome>>,
    publisher: watch::Sender<ListSnapshot>,
}

impl<A: CatalogApi> ProductListController<A> {
    /// Start a controller on the current runtime.
    ///
    /// Categories and the unfiltered product list are fetched immediately.
    #[must_use]
    pub fn spawn(
        api: Arc<A>,
        token: SecretString,
        capabilities: ProductCapabilities,
        debounce: Duration,
    ) -> (ProductListHandle, JoinHandle<()>) {
        let state = ListSnapshot {
            capabilities,
            ..ListSnapshot::default()
        };
        let (publisher, receiver) = watch::channel(state.clone());
        let (commands, inbox) = mpsc::unbounded_channel();

        let controller = Self {
            api,
            token,
            debounce,
            state,
            debounce_deadline: None,
            in_flight: FuturesUnordered::new(),
            publisher,
        };
        let task = tokio::spawn(controller.run(inbox));

        (
            ProductListHandle {
                commands,
                state: receiver,
            },
            task,
        )
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        self.mount();
        self.publish();

        loop {
            let event = tokio::select! {
                command = inbox.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => Event::Command(command),
                },
                () = wait_for_deadline(self.debounce_deadline) => Event::DebounceElapsed,
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    Event::Completed(outcome)
                }
            };

            match event {
                Event::Command(command) => self.handle(command),
                Event::DebounceElapsed => self.apply_search_input(),
                Event::Completed(outcome) => self.apply(outcome),
            }
            self.publish();
        }

        debug!(
            abandoned = self.in_flight.len(),
            "Product list controller stopped"
        );
    }

    fn mount(&mut self) {
        let api = Arc::clone(&self.api);
        let token = self.token.clone();
        self.push(async move { Outcome::Categories(api.list_categories(&token).await) });
        self.fetch_products();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SearchInput(text) => {
                self.state.search_input = text;
                self.debounce_deadline = Some(Instant::now() + self.debounce);
            }
            Command::SelectCategory(category_id) => {
                if self.state.filter.category_id != category_id {
                    self.state.filter.category_id = category_id;
                    self.fetch_products();
                }
            }
            Command::ClearFilters => {
                self.state.search_input.clear();
                self.debounce_deadline = None;
                if !self.state.filter.is_empty() {
                    self.state.filter = FilterState::default();
                    self.fetch_products();
                }
            }
            Command::Reload => self.fetch_products(),
            Command::RequestDelete(id) => self.request_delete(id),
            Command::ConfirmDelete(confirmed) => self.confirm_delete(confirmed),
            Command::DismissAlert => self.state.alert = None,
            // Handled by the run loop.
            Command::Shutdown => {}
        }
    }

    /// The quiet period elapsed: promote the staged input.
    fn apply_search_input(&mut self) {
        self.debounce_deadline = None;
        if self.state.search_input != self.state.filter.search_term {
            self.state.filter.search_term = self.state.search_input.clone();
            self.fetch_products();
        }
    }

    fn fetch_products(&mut self) {
        self.state.latest_request += 1;
        self.state.status = ListStatus::Loading;

        let request = self.state.latest_request;
        let query = self.state.filter.query();
        debug!(request, search = %query.search, category_id = ?query.category_id, "Fetching products");

        let api = Arc::clone(&self.api);
        let token = self.token.clone();
        self.push(async move {
            let result = api.list_products(&token, &query).await;
            Outcome::Products { request, result }
        });
    }

    fn request_delete(&mut self, id: ProductId) {
        if self.state.capabilities.delete {
            self.state.pending_delete = Some(id);
        } else {
            warn!(product_id = %id, "Delete requested without permission");
            self.state.alert = Some(DELETE_NOT_PERMITTED.to_owned());
        }
    }

    fn confirm_delete(&mut self, confirmed: bool) {
        let Some(id) = self.state.pending_delete.take() else {
            debug!("No delete awaiting confirmation");
            return;
        };
        if !confirmed {
            debug!(product_id = %id, "Delete cancelled");
            return;
        }

        let api = Arc::clone(&self.api);
        let token = self.token.clone();
        self.push(async move {
            let result = api.delete_product(&token, id).await;
            Outcome::Deleted { id, result }
        });
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Products { request, result } => {
                if request != self.state.latest_request {
                    debug!(
                        request,
                        latest = self.state.latest_request,
                        "Discarding stale product response"
                    );
                    return;
                }
                match result {
                    Ok(products) => {
                        debug!(request, count = products.len(), "Products loaded");
                        self.state.products = products;
                        self.state.status = ListStatus::Ready;
                    }
                    Err(e) => {
                        error!(request, error = %e, "Failed to fetch products");
                        self.state.status = ListStatus::Errored;
                        self.note_failure(&e);
                    }
                }
            }
            Outcome::Categories(Ok(categories)) => {
                debug!(count = categories.len(), "Categories loaded");
                self.state.categories = categories;
            }
            Outcome::Categories(Err(e)) => {
                error!(error = %e, "Failed to fetch categories");
                self.note_failure(&e);
            }
            Outcome::Deleted { id, result: Ok(()) } => {
                info!(product_id = %id, "Product deleted");
                self.fetch_products();
            }
            Outcome::Deleted { id, result: Err(e) } => {
                error!(product_id = %id, error = %e, "Failed to delete product");
                self.state.alert = Some(DELETE_FAILED.to_owned());
                self.note_failure(&e);
            }
        }
    }

    fn note_failure(&mut self, error: &ApiError) {
        if matches!(error, ApiError::Unauthenticated) {
            self.state.session_expired = true;
        }
    }

    fn push(&mut self, future: impl Future<Output = Outcome> + Send + 'static) {
        self.in_flight.push(future.boxed());
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tokio::time::sleep;

    use super::*;
    use crate::testing::{FakeCatalog, category, product};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn catalog() -> FakeCatalog {
        let shoes = category(1, "Shoes");
        let hats = category(2, "Hats");
        FakeCatalog::new()
            .with_categories(vec![shoes.clone(), hats.clone()])
            .with_products(vec![
                product(1, "Red shoes", Some(&shoes)),
                product(2, "Blue shoes", Some(&shoes)),
                product(3, "Sun hat", Some(&hats)),
            ])
    }

    fn start(
        api: &Arc<FakeCatalog>,
        capabilities: ProductCapabilities,
    ) -> (ProductListHandle, JoinHandle<()>) {
        ProductListController::spawn(
            Arc::clone(api),
            SecretString::from("t"),
            capabilities,
            DEBOUNCE,
        )
    }

    async fn mounted(api: &Arc<FakeCatalog>) -> (ProductListHandle, JoinHandle<()>) {
        let (list, task) = start(api, ProductCapabilities::all());
        list.wait_until(|s| s.status == ListStatus::Ready).await.unwrap();
        api.clear_queries();
        (list, task)
    }

    fn names(snapshot: &ListSnapshot) -> Vec<&str> {
        snapshot.products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_categories_and_unfiltered_products() {
        let api = Arc::new(catalog());
        let (list, _task) = start(&api, ProductCapabilities::all());
        assert_eq!(list.snapshot().status, ListStatus::Idle);

        let snapshot = list
            .wait_until(|s| s.status == ListStatus::Ready && !s.categories.is_empty())
            .await
            .unwrap();
        assert_eq!(snapshot.products.len(), 3);
        assert_eq!(snapshot.categories.len(), 2);
        assert_eq!(api.queries(), vec![ProductQuery::default()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_quiet_period_fetch_once() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.input_search("shoe");
        sleep(Duration::from_millis(100)).await;
        list.input_search("shoes");
        assert_eq!(list.snapshot().filter.search_term, "");

        sleep(Duration::from_millis(600)).await;
        assert_eq!(api.queries(), vec![ProductQuery::new("shoes", None)]);

        let snapshot = list.snapshot();
        assert_eq!(snapshot.filter.search_term, "shoes");
        assert_eq!(names(&snapshot), vec!["Red shoes", "Blue shoes"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_keystrokes_fetches_twice() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.input_search("shoe");
        sleep(Duration::from_millis(600)).await;
        list.input_search("shoes");
        sleep(Duration::from_millis(600)).await;

        assert_eq!(
            api.queries(),
            vec![
                ProductQuery::new("shoe", None),
                ProductQuery::new("shoes", None)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_staged_input_is_visible_immediately() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.input_search("r");
        sleep(Duration::from_millis(1)).await;
        let snapshot = list.snapshot();
        assert_eq!(snapshot.search_input, "r");
        assert!(snapshot.filter.search_term.is_empty());
        assert!(api.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_change_fetches_once() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.select_category(Some(CategoryId::new(2)));
        list.select_category(Some(CategoryId::new(2)));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(
            api.queries(),
            vec![ProductQuery::new("", Some(CategoryId::new(2)))]
        );
        assert_eq!(names(&list.snapshot()), vec!["Sun hat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_filters_resets_both_with_one_fetch() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.select_category(Some(CategoryId::new(1)));
        list.input_search("red");
        sleep(Duration::from_millis(600)).await;
        assert_eq!(list.snapshot().products.len(), 1);
        api.clear_queries();

        list.clear_filters();
        sleep(Duration::from_millis(10)).await;

        let snapshot = list.snapshot();
        assert!(snapshot.filter.is_empty());
        assert!(snapshot.search_input.is_empty());
        assert_eq!(api.queries(), vec![ProductQuery::default()]);
        assert!(api.queries()[0].to_pairs().is_empty());
        assert_eq!(snapshot.products.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_filters_cancels_pending_search() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.input_search("hat");
        list.clear_filters();
        sleep(Duration::from_millis(1000)).await;

        assert!(api.queries().is_empty());
        assert!(list.snapshot().search_input.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(catalog().with_search_delay("red", Duration::from_secs(2)));
        let (list, _task) = mounted(&api).await;

        list.input_search("red");
        sleep(Duration::from_millis(600)).await;
        assert!(list.snapshot().is_loading());

        list.input_search("hat");
        sleep(Duration::from_secs(3)).await;

        let snapshot = list.snapshot();
        assert_eq!(api.queries().len(), 2);
        assert_eq!(snapshot.status, ListStatus::Ready);
        assert_eq!(names(&snapshot), vec!["Sun hat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_previous_products() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        api.fail_lists(true);
        list.reload();
        sleep(Duration::from_millis(10)).await;

        let snapshot = list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Errored);
        assert_eq!(snapshot.products.len(), 3);
        assert!(!snapshot.session_expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_is_reported() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        api.expire_token();
        list.reload();
        let snapshot = list.wait_until(|s| s.session_expired).await.unwrap();
        assert_eq!(snapshot.status, ListStatus::Errored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_requires_confirmation() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        list.request_delete(ProductId::new(1));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(list.snapshot().pending_delete, Some(ProductId::new(1)));

        list.confirm_delete(false);
        sleep(Duration::from_millis(10)).await;
        assert!(api.deletes().is_empty());
        assert!(list.snapshot().pending_delete.is_none());

        list.request_delete(ProductId::new(1));
        list.confirm_delete(true);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(api.deletes(), vec![ProductId::new(1)]);
        assert_eq!(api.queries(), vec![ProductQuery::default()]);
        assert_eq!(names(&list.snapshot()), vec!["Blue shoes", "Sun hat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_raises_alert_without_refetch() {
        let api = Arc::new(catalog());
        let (list, _task) = mounted(&api).await;

        api.fail_deletes(true);
        list.request_delete(ProductId::new(3));
        list.confirm_delete(true);
        sleep(Duration::from_millis(10)).await;

        let snapshot = list.snapshot();
        assert_eq!(snapshot.alert.as_deref(), Some(DELETE_FAILED));
        assert_eq!(snapshot.products.len(), 3);
        assert!(api.queries().is_empty());

        list.dismiss_alert();
        sleep(Duration::from_millis(1)).await;
        assert!(list.snapshot().alert.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_without_permission_shows_notice() {
        let api = Arc::new(catalog());
        let view_only = ProductCapabilities {
            view: true,
            ..ProductCapabilities::default()
        };
        let (list, _task) = start(&api, view_only);

        list.request_delete(ProductId::new(1));
        list.confirm_delete(true);
        sleep(Duration::from_millis(10)).await;

        let snapshot = list.snapshot();
        assert_eq!(snapshot.alert.as_deref(), Some(DELETE_NOT_PERMITTED));
        assert!(snapshot.pending_delete.is_none());
        assert!(api.deletes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_from_one_handle_stops_all() {
        let api = Arc::new(catalog());
        let (list, task) = mounted(&api).await;
        let observer = list.clone();

        drop(list);
        assert!(observer.is_running());
        observer.shutdown();
        task.await.unwrap();
        assert!(!observer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_exits_when_every_handle_is_dropped() {
        let api = Arc::new(catalog());
        let (list, task) = mounted(&api).await;
        let other = list.clone();

        list.input_search("mug");
        drop(list);
        drop(other);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        // The pending search dies with the controller
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(api.queries().is_empty());
    }
}
