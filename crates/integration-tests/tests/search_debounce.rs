//! Debounced search through a dashboard opened from a real session.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use catalog_admin::storage::MemoryStorage;
use catalog_admin::testing::FakeCatalog;
use catalog_admin::views::{Dashboard, ListStatus};
use catalog_core::{CategoryId, ProductQuery};
use catalog_integration_tests::{DEBOUNCE, logged_in, seeded_catalog, user_with_roles};
use tokio::time::sleep;

async fn ready_dashboard(api: &Arc<FakeCatalog>) -> Dashboard<FakeCatalog> {
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["viewer"]));
    let dashboard = Dashboard::open(Arc::clone(api), &session, DEBOUNCE).unwrap();
    dashboard
        .list()
        .wait_until(|s| s.status == ListStatus::Ready && !s.categories.is_empty())
        .await
        .unwrap();
    api.clear_queries();
    dashboard
}

#[tokio::test(start_paused = true)]
async fn test_typing_inside_quiet_period_sends_one_request() {
    let api = Arc::new(seeded_catalog());
    let dashboard = ready_dashboard(&api).await;
    let list = dashboard.list();

    list.input_search("shoe");
    sleep(Duration::from_millis(200)).await;
    list.input_search("shoes");
    sleep(Duration::from_millis(700)).await;

    assert_eq!(api.queries(), vec![ProductQuery::new("shoes", None)]);
    let snapshot = list.snapshot();
    assert_eq!(snapshot.filter.search_term, "shoes");
    assert_eq!(snapshot.products.len(), 2);
    dashboard.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_longer_than_quiet_period_sends_two_requests() {
    let api = Arc::new(seeded_catalog());
    let dashboard = ready_dashboard(&api).await;
    let list = dashboard.list();

    list.input_search("shoe");
    sleep(Duration::from_millis(600)).await;
    list.input_search("shoes");
    sleep(Duration::from_millis(600)).await;

    assert_eq!(
        api.queries(),
        vec![
            ProductQuery::new("shoe", None),
            ProductQuery::new("shoes", None),
        ]
    );
    dashboard.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_filters_resets_both_and_fetches_once() {
    let api = Arc::new(seeded_catalog());
    let dashboard = ready_dashboard(&api).await;
    let list = dashboard.list();

    list.select_category(Some(CategoryId::new(2)));
    list.input_search("hat");
    sleep(Duration::from_millis(600)).await;
    assert_eq!(list.snapshot().products.len(), 1);
    api.clear_queries();

    list.clear_filters();
    let snapshot = list
        .wait_until(|s| s.filter.is_empty() && s.status == ListStatus::Ready)
        .await
        .unwrap();
    sleep(DEBOUNCE * 2).await;

    assert!(snapshot.search_input.is_empty());
    assert_eq!(snapshot.filter.category_id, None);
    assert_eq!(api.queries(), vec![ProductQuery::default()]);
    assert!(api.queries().iter().all(|q| q.to_pairs().is_empty()));
    assert_eq!(list.snapshot().products.len(), 3);
    dashboard.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_stale_response_does_not_overwrite_newer_results() {
    let api = Arc::new(seeded_catalog().with_search_delay("shoe", Duration::from_secs(3)));
    let dashboard = ready_dashboard(&api).await;
    let list = dashboard.list();

    list.input_search("shoe");
    sleep(Duration::from_millis(600)).await;
    list.input_search("hat");
    sleep(Duration::from_millis(600)).await;
    assert_eq!(list.snapshot().products.len(), 1);

    // The slow "shoe" response lands after the "hat" one
    sleep(Duration::from_secs(4)).await;
    let snapshot = list.snapshot();
    assert_eq!(snapshot.filter.search_term, "hat");
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.products.first().unwrap().name, "Sun hat");
    dashboard.close().await;
}
