//! End-to-end dashboard flow: login, browse, create, delete, logout.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use catalog_admin::catalog::Credentials;
use catalog_admin::services::SessionStore;
use catalog_admin::storage::MemoryStorage;
use catalog_admin::testing::{CreateFailure, FakeCatalog};
use catalog_admin::views::product_form::CREATE_NOT_PERMITTED;
use catalog_admin::views::product_list::{DELETE_FAILED, DELETE_NOT_PERMITTED};
use catalog_admin::views::{Dashboard, ListStatus, ProductFormFields, Route};
use catalog_core::{ProductId, ProductQuery};
use catalog_integration_tests::{DEBOUNCE, logged_in, seeded_catalog, user_with_roles};
use secrecy::SecretString;
use tokio::time::sleep;

fn form_fields(name: &str, price: &str) -> ProductFormFields {
    ProductFormFields {
        name: name.into(),
        price: price.into(),
        ..ProductFormFields::default()
    }
}

// =============================================================================
// Full Session
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_login_create_and_delete_flow() {
    let api = Arc::new(seeded_catalog().with_login_user(user_with_roles(&["admin"])));
    let storage = Arc::new(MemoryStorage::new());
    let mut session = SessionStore::load(Arc::clone(&storage)).unwrap();
    assert_eq!(Route::for_session(&session), Route::Login);

    let credentials = Credentials {
        email: "aina@example.com".into(),
        password: SecretString::from("secret"),
    };
    session.authenticate(api.as_ref(), &credentials).await.unwrap();
    assert_eq!(Route::for_session(&session), Route::Dashboard);
    assert!(!storage.is_empty());

    let mut dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();
    assert!(dashboard.create_notice().is_none());
    let list = dashboard.list().clone();
    let loaded = list
        .wait_until(|s| s.status == ListStatus::Ready && !s.categories.is_empty())
        .await
        .unwrap();
    assert_eq!(loaded.products.len(), 3);

    // Create reloads the list
    let form = dashboard.form().unwrap();
    form.set_fields(form_fields("Canvas tote", "12.50"));
    form.attach_photo_bytes("tote.jpg", vec![0xFF, 0xD8, 0xFF]).unwrap();
    let created = form.submit().await.unwrap().unwrap();
    assert_eq!(form.fields(), &ProductFormFields::default());
    assert!(form.photo().is_none());

    let reloaded = list
        .wait_until(|s| s.products.iter().any(|p| p.id == created.id))
        .await
        .unwrap();
    assert_eq!(reloaded.products.len(), 4);
    assert_eq!(api.creates().first().unwrap().photo.as_deref(), Some("tote.jpg"));

    // Delete needs confirmation
    list.request_delete(ProductId::new(3));
    list.wait_until(|s| s.pending_delete == Some(ProductId::new(3)))
        .await
        .unwrap();
    assert!(api.deletes().is_empty());
    list.confirm_delete(true);
    let after = list
        .wait_until(|s| s.status == ListStatus::Ready && s.products.len() == 3)
        .await
        .unwrap();
    assert!(after.products.iter().all(|p| p.id != ProductId::new(3)));
    assert_eq!(api.deletes(), vec![ProductId::new(3)]);

    dashboard.logout(&mut session).await.unwrap();
    assert_eq!(api.logout_calls(), 1);
    assert!(storage.is_empty());
    assert!(!list.is_running());
    assert_eq!(Route::for_session(&session), Route::Login);
}

#[tokio::test(start_paused = true)]
async fn test_declined_delete_leaves_product() {
    let api = Arc::new(seeded_catalog());
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["admin"]));
    let dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();
    let list = dashboard.list().clone();
    list.wait_until(|s| s.status == ListStatus::Ready).await.unwrap();

    list.request_delete(ProductId::new(1));
    list.wait_until(|s| s.pending_delete.is_some()).await.unwrap();
    list.confirm_delete(false);
    let snapshot = list.wait_until(|s| s.pending_delete.is_none()).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    assert!(api.deletes().is_empty());
    assert_eq!(snapshot.products.len(), 3);
    dashboard.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_raises_alert() {
    let api = Arc::new(seeded_catalog());
    api.fail_deletes(true);
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["admin"]));
    let dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();
    let list = dashboard.list().clone();
    list.wait_until(|s| s.status == ListStatus::Ready).await.unwrap();

    list.request_delete(ProductId::new(2));
    list.confirm_delete(true);
    let snapshot = list.wait_until(|s| s.alert.is_some()).await.unwrap();

    assert_eq!(snapshot.alert.as_deref(), Some(DELETE_FAILED));
    assert_eq!(snapshot.products.len(), 3);
    dashboard.close().await;
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_viewer_sees_notice_and_no_actions() {
    let api = Arc::new(seeded_catalog());
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["viewer"]));
    let mut dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();

    assert!(dashboard.form().is_none());
    assert_eq!(dashboard.create_notice(), Some(CREATE_NOT_PERMITTED));
    let capabilities = dashboard.capabilities();
    assert!(capabilities.view);
    assert!(!capabilities.delete);
    assert!(!capabilities.shows_actions());

    let list = dashboard.list().clone();
    list.wait_until(|s| s.status == ListStatus::Ready).await.unwrap();
    list.request_delete(ProductId::new(1));
    let snapshot = list.wait_until(|s| s.alert.is_some()).await.unwrap();
    assert_eq!(snapshot.alert.as_deref(), Some(DELETE_NOT_PERMITTED));
    assert!(snapshot.pending_delete.is_none());
    assert!(api.deletes().is_empty());
    dashboard.close().await;
}

// =============================================================================
// Create Failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_field_errors_are_joined_in_order() {
    let api = Arc::new(FakeCatalog::new());
    api.fail_creates(Some(CreateFailure::Validation(vec![
        ("name".into(), vec!["required".into()]),
        ("price".into(), vec!["must be positive".into()]),
    ])));
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["staff"]));
    let mut dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();
    dashboard
        .list()
        .wait_until(|s| s.status == ListStatus::Ready)
        .await
        .unwrap();
    api.clear_queries();

    let form = dashboard.form().unwrap();
    form.set_fields(form_fields("Tote", "1.00"));
    assert!(form.submit().await.is_err());
    assert_eq!(form.error(), Some("required, must be positive"));
    assert!(!form.is_submitting());
    assert_eq!(form.fields().name, "Tote");

    // No reload after a failed create
    sleep(Duration::from_millis(10)).await;
    assert_eq!(api.queries(), Vec::<ProductQuery>::new());
    dashboard.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_submitting_flag_tracks_pending_create() {
    let api = Arc::new(FakeCatalog::new().with_create_delay(Duration::from_secs(2)));
    let session = logged_in(MemoryStorage::new(), user_with_roles(&["staff"]));
    let mut dashboard = Dashboard::open(Arc::clone(&api), &session, DEBOUNCE).unwrap();

    let form = dashboard.form().unwrap();
    form.set_fields(form_fields("Tote", "1.00"));
    let flag = form.submitting_flag();

    let mut first = Box::pin(form.submit());
    tokio::select! {
        _ = &mut first => panic!("create finished too early"),
        () = sleep(Duration::from_millis(100)) => {}
    }
    assert!(flag.get());

    let result = first.await;
    assert!(result.is_ok());
    assert!(!flag.get());
    assert_eq!(api.creates().len(), 1);
    dashboard.close().await;
}
