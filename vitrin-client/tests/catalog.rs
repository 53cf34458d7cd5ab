//! Catalog and category store tests

mod common;

use common::{backend, draft, login, manager, stores};
use rust_decimal::Decimal;
use vitrin_client::{ClientError, ProductPatch};

#[tokio::test]
async fn test_add_then_fetch_round_trips_all_fields() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    let category_id = stores.categories.ensure_by_name("Shoes").await.unwrap();
    let mut d = draft("Runner", Some(7));
    d.category_id = Some(category_id);
    stores.catalog.add(d.clone()).await.unwrap();

    stores.catalog.fetch().await.unwrap();
    let product = &stores.catalog.items()[0];
    assert_eq!(product.title, "Runner");
    assert_eq!(product.price, d.price);
    assert_eq!(product.image, d.image);
    assert_eq!(product.stock, Some(7));
    assert_eq!(product.description, d.description);
    assert_eq!(product.category_name.as_deref(), Some("Shoes"));
}

#[tokio::test]
async fn test_list_is_newest_created_first() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.catalog.add(draft("First", None)).await.unwrap();
    stores.catalog.add(draft("Second", None)).await.unwrap();

    // Echoed rows are prepended; a refetch resets to creation order
    assert_eq!(stores.catalog.items()[0].title, "Second");
    stores.catalog.fetch().await.unwrap();
    assert_eq!(stores.catalog.items()[0].title, "Second");
    assert_eq!(stores.catalog.items()[1].title, "First");
}

#[tokio::test]
async fn test_echo_missing_falls_back_to_resync() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    backend.suppress_echo(true);
    stores.catalog.add(draft("Blind", Some(1))).await.unwrap();

    // The write landed and the fallback refetch mirrored it
    assert_eq!(stores.catalog.items().len(), 1);
    assert_eq!(stores.catalog.items()[0].title, "Blind");
}

#[tokio::test]
async fn test_update_replaces_in_place() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.catalog.add(draft("Old", None)).await.unwrap();
    stores.catalog.add(draft("Other", None)).await.unwrap();
    let id = stores.catalog.items()[1].id.clone();

    let patch = ProductPatch {
        title: Some("New".to_string()),
        price: Some(Decimal::new(2999, 2)),
        ..ProductPatch::default()
    };
    stores.catalog.update(&id, patch).await.unwrap();

    // Updated-in-place items keep their original position
    assert_eq!(stores.catalog.items()[1].id, id);
    assert_eq!(stores.catalog.items()[1].title, "New");
    assert_eq!(stores.catalog.items()[1].price, Decimal::new(2999, 2));
}

#[tokio::test]
async fn test_remove_deletes_remote_and_local() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.catalog.add(draft("Doomed", None)).await.unwrap();
    let id = stores.catalog.items()[0].id.clone();

    stores.catalog.remove(&id).await.unwrap();
    assert!(stores.catalog.items().is_empty());

    stores.catalog.fetch().await.unwrap();
    assert!(stores.catalog.items().is_empty());
}

#[tokio::test]
async fn test_validation_rejects_before_any_network_call() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    backend.fail_next("must not be reached");

    let mut bad = draft("Negative", None);
    bad.price = Decimal::new(-100, 2);
    assert!(matches!(
        stores.catalog.add(bad).await,
        Err(ClientError::Validation(_))
    ));

    // The injected failure was never consumed: no network call happened
    assert!(backend.failure_pending());
}

#[tokio::test]
async fn test_non_admin_product_write_is_forbidden() {
    let backend = backend();
    backend.seed_user("user@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "user@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    assert!(matches!(
        stores.catalog.add(draft("Nope", None)).await,
        Err(ClientError::Forbidden(_))
    ));
}

// ========== Category store ==========

#[tokio::test]
async fn test_ensure_by_name_is_sequentially_idempotent() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    let first = stores.categories.ensure_by_name("Shoes").await.unwrap();
    let second = stores.categories.ensure_by_name("Shoes").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.category_rows_named("Shoes"), 1);
}

#[tokio::test]
async fn test_ensure_by_name_is_case_insensitive() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    let first = stores.categories.ensure_by_name("Shoes").await.unwrap();
    let second = stores.categories.ensure_by_name("  shoes ").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.category_rows_named("Shoes"), 1);
}

#[tokio::test]
async fn test_ensure_by_name_cache_hit_costs_no_network() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    let id = stores.categories.ensure_by_name("Books").await.unwrap();

    backend.fail_next("must not be reached");
    let cached = stores.categories.ensure_by_name("books").await.unwrap();

    assert_eq!(id, cached);
    assert!(backend.failure_pending());
}

#[tokio::test]
async fn test_ensure_by_name_finds_existing_remote_row() {
    let backend = backend();
    backend.seed_admin("admin@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "admin@example.com", "pw").await;

    let mut first_client = stores(&backend, &manager);
    let id = first_client.categories.ensure_by_name("Home").await.unwrap();

    // A fresh store with a cold cache resolves the same remote row
    let mut second_client = stores(&backend, &manager);
    let found = second_client.categories.ensure_by_name("home").await.unwrap();

    assert_eq!(id, found);
    assert_eq!(backend.category_rows_named("Home"), 1);
}

#[tokio::test]
async fn test_ensure_by_name_rejects_empty_names() {
    let backend = backend();
    let manager = manager(&backend);
    manager.initialize().await;
    let mut stores = stores(&backend, &manager);

    assert!(matches!(
        stores.categories.ensure_by_name("   ").await,
        Err(ClientError::Validation(_))
    ));
}
