//! Shared test wiring: a fresh mock backend plus a session manager and
//! stores constructed per test.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use rust_decimal::Decimal;

use vitrin_client::service::{AuthService, DataService};
use vitrin_client::{
    CurrentUser, LoginOutcome, ProductDraft, SessionCache, SessionManager, Stores,
};
use vitrin_mock::MockBackend;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn backend() -> Arc<MockBackend> {
    init_tracing();
    Arc::new(MockBackend::new())
}

/// Session manager without disk persistence
pub fn manager(backend: &Arc<MockBackend>) -> SessionManager {
    SessionManager::new(backend.clone(), backend.clone(), SessionCache::disabled())
}

pub fn stores(backend: &Arc<MockBackend>, manager: &SessionManager) -> Stores {
    Stores::new(backend.clone(), manager.handle())
}

/// Login that must succeed
pub async fn login(manager: &SessionManager, email: &str, password: &str) -> CurrentUser {
    match manager.login(email, password).await {
        LoginOutcome::Success(user) => user,
        other => panic!("expected successful login, got {other:?}"),
    }
}

pub fn draft(title: &str, stock: Option<i64>) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        price: Decimal::new(1999, 2),
        image: Some("https://cdn.example.com/p.png".to_string()),
        stock,
        description: Some("test product".to_string()),
        category_id: None,
    }
}

/// Insert a product through a temporary admin session; returns its id.
/// The mock's current session is signed out afterwards.
pub async fn seed_product(backend: &Arc<MockBackend>, title: &str, stock: Option<i64>) -> String {
    backend.seed_admin("seed-admin@example.com", "seed-pass");
    backend
        .sign_in("seed-admin@example.com", "seed-pass")
        .await
        .expect("seed admin sign-in");
    let product = backend
        .insert_product(&draft(title, stock))
        .await
        .expect("seed product insert")
        .expect("seed product echo");
    backend.sign_out().await.expect("seed admin sign-out");
    product.id
}
