mod common;

use common::{editor, FakeGateway};
use std::sync::Arc;
use tradeflow::{
    editor::{Dashboard, Route},
    error::{EditorError, ValidationError},
};

#[tokio::test]
async fn listing_is_fetched_once_until_invalidated() {
    let gateway = FakeGateway::new();
    gateway.seed("A", Vec::new(), Vec::new());
    let (_, cache) = editor(&gateway);

    assert_eq!(cache.list().await.unwrap().len(), 1);
    assert_eq!(cache.list().await.unwrap().len(), 1);
    assert_eq!(gateway.call_count("list"), 1);

    cache.invalidate_listing();
    cache.list().await.unwrap();
    assert_eq!(gateway.call_count("list"), 2);
}

#[tokio::test]
async fn fetch_racing_an_invalidation_is_not_stored() {
    let gateway = FakeGateway::new();
    let (_, cache) = editor(&gateway);

    let gate = gateway.hold("list");
    let (listing, ()) = tokio::join!(cache.list(), async {
        cache.invalidate_listing();
        gate.notify_one();
    });

    assert!(listing.is_ok());
    assert!(!cache.is_listing_cached());
}

#[tokio::test]
async fn dashboard_mutations_invalidate_cache() {
    let gateway = FakeGateway::new();
    let (_, cache) = editor(&gateway);
    let dashboard = Dashboard::new(Arc::clone(&cache));

    assert!(dashboard.list().await.unwrap().is_empty());
    let Route::EditWorkflow(id) = dashboard.create("  Pairs  ").await.unwrap() else {
        panic!("create should route to the editor");
    };
    assert!(!cache.is_listing_cached());
    assert_eq!(gateway.stored(id).unwrap().name, "Pairs");

    cache.document(id).await.unwrap();
    dashboard.set_active(id, true).await.unwrap();
    assert!(!cache.is_document_cached(id));
    assert!(dashboard.list().await.unwrap()[0].is_active);

    dashboard.delete(id).await.unwrap();
    assert!(dashboard.list().await.unwrap().is_empty());
    assert_eq!(dashboard.delete(id).await, Err(EditorError::NotFound));
}

#[tokio::test]
async fn dashboard_rejects_blank_names_locally() {
    let gateway = FakeGateway::new();
    let (_, cache) = editor(&gateway);
    let dashboard = Dashboard::new(cache);

    assert_eq!(
        dashboard.create("").await,
        Err(EditorError::Validation(ValidationError::EmptyName))
    );
    assert!(gateway.calls().is_empty());
}
