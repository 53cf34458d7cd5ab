//! Cart store synchronization tests

mod common;

use common::{backend, login, manager, seed_product, stores};
use vitrin_client::ClientError;

#[tokio::test]
async fn test_quantity_aggregation() {
    let backend = backend();
    let p1 = seed_product(&backend, "Keyboard", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    let alice = login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 2).await.unwrap();
    stores.cart.add(&p1, 3).await.unwrap();

    assert_eq!(stores.cart.lines().len(), 1);
    assert_eq!(stores.cart.line(&p1).unwrap().qty, 5);
    assert_eq!(stores.cart.total_quantity(), 5);

    // Exactly one remote row for the (user, product) pair
    let rows = backend.cart_rows(&alice.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].qty, 5);
}

#[tokio::test]
async fn test_decrease_floors_at_deletion() {
    let backend = backend();
    let p1 = seed_product(&backend, "Mouse", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    let alice = login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 2).await.unwrap();
    stores.cart.decrease(&p1, 5).await.unwrap();

    assert!(stores.cart.line(&p1).is_none());
    assert_eq!(stores.cart.total_quantity(), 0);
    assert!(backend.cart_rows(&alice.id).is_empty());
}

#[tokio::test]
async fn test_at_most_one_line_per_product() {
    let backend = backend();
    let p1 = seed_product(&backend, "Lamp", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    let alice = login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 1).await.unwrap();
    stores.cart.set_qty(&p1, 4).await.unwrap();
    stores.cart.increase(&p1, 2).await.unwrap();
    stores.cart.decrease(&p1, 1).await.unwrap();
    stores.cart.add(&p1, 1).await.unwrap();

    assert_eq!(stores.cart.lines().len(), 1);
    assert_eq!(stores.cart.line(&p1).unwrap().qty, 6);
    assert_eq!(backend.cart_rows(&alice.id).len(), 1);
}

#[tokio::test]
async fn test_failed_write_leaves_local_state_unchanged() {
    let backend = backend();
    let p1 = seed_product(&backend, "Desk", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 2).await.unwrap();

    backend.fail_next("connection reset");
    let result = stores.cart.set_qty(&p1, 7).await;

    assert!(matches!(result, Err(ClientError::Remote(_))));
    assert_eq!(stores.cart.line(&p1).unwrap().qty, 2);
    assert_eq!(stores.cart.total_quantity(), 2);
}

#[tokio::test]
async fn test_purchase_flow_removes_selection_and_decrements_stock() {
    let backend = backend();
    let p1 = seed_product(&backend, "Chair", Some(10)).await;
    let p2 = seed_product(&backend, "Table", Some(10)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 2).await.unwrap();
    stores.cart.add(&p2, 1).await.unwrap();
    assert_eq!(stores.cart.total_quantity(), 3);

    stores.cart.checkout(&[p1.clone()]).await.unwrap();

    assert_eq!(stores.cart.lines().len(), 1);
    assert_eq!(stores.cart.line(&p2).unwrap().qty, 1);
    assert_eq!(stores.cart.total_quantity(), 1);
    assert_eq!(backend.product_stock(&p1), Some(8));
    assert_eq!(backend.product_stock(&p2), Some(10));
}

#[tokio::test]
async fn test_checkout_insufficient_stock_aborts_before_removal() {
    let backend = backend();
    let p1 = seed_product(&backend, "Rug", Some(1)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 3).await.unwrap();
    let result = stores.cart.checkout(&[p1.clone()]).await;

    assert!(matches!(result, Err(ClientError::Validation(_))));
    assert_eq!(stores.cart.line(&p1).unwrap().qty, 3);
    assert_eq!(backend.product_stock(&p1), Some(1));
}

#[tokio::test]
async fn test_remove_many_is_batched() {
    let backend = backend();
    let p1 = seed_product(&backend, "Pen", Some(50)).await;
    let p2 = seed_product(&backend, "Pad", Some(50)).await;
    let p3 = seed_product(&backend, "Ink", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    let alice = login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 1).await.unwrap();
    stores.cart.add(&p2, 2).await.unwrap();
    stores.cart.add(&p3, 3).await.unwrap();

    stores.cart.remove_many(&[p1.clone(), p3.clone()]).await.unwrap();

    assert_eq!(stores.cart.lines().len(), 1);
    assert_eq!(stores.cart.total_quantity(), 2);
    assert_eq!(backend.cart_rows(&alice.id).len(), 1);
}

#[tokio::test]
async fn test_mutators_require_authentication() {
    let backend = backend();
    let p1 = seed_product(&backend, "Mug", Some(50)).await;

    let manager = manager(&backend);
    manager.initialize().await;
    let mut stores = stores(&backend, &manager);

    assert!(matches!(
        stores.cart.add(&p1, 1).await,
        Err(ClientError::AuthRequired)
    ));
    assert!(matches!(
        stores.cart.fetch().await,
        Err(ClientError::AuthRequired)
    ));
    assert!(matches!(
        stores.cart.remove(&p1).await,
        Err(ClientError::AuthRequired)
    ));
}

#[tokio::test]
async fn test_logout_isolation_between_users() {
    let backend = backend();
    let p1 = seed_product(&backend, "Hat", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");
    backend.seed_user("bob@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 4).await.unwrap();
    stores.favorites.add(&p1).await.unwrap();

    manager.logout().await;
    stores.clear_local();
    assert!(stores.cart.lines().is_empty());
    assert_eq!(stores.cart.total_quantity(), 0);
    assert!(stores.favorites.is_empty());

    login(&manager, "bob@example.com", "pw").await;
    stores.cart.fetch().await.unwrap();
    stores.favorites.fetch().await.unwrap();

    assert!(stores.cart.lines().is_empty());
    assert!(stores.favorites.is_empty());
}

#[tokio::test]
async fn test_fetch_orders_most_recently_updated_first() {
    let backend = backend();
    let p1 = seed_product(&backend, "A", Some(50)).await;
    let p2 = seed_product(&backend, "B", Some(50)).await;
    backend.seed_user("alice@example.com", "pw");

    let manager = manager(&backend);
    manager.initialize().await;
    login(&manager, "alice@example.com", "pw").await;
    let mut stores = stores(&backend, &manager);

    stores.cart.add(&p1, 1).await.unwrap();
    stores.cart.add(&p2, 1).await.unwrap();
    // Touching p1 again makes it the most recently updated
    stores.cart.increase(&p1, 1).await.unwrap();

    stores.cart.fetch().await.unwrap();
    assert_eq!(stores.cart.lines()[0].product_id, p1);
    assert_eq!(stores.cart.lines()[1].product_id, p2);
}
