//! In-memory mock of the remote data service
//!
//! Implements both service traits for integration tests and local
//! development. The rules the real backend enforces live here too:
//! per-user row visibility, (user, product) uniqueness on cart and
//! favorites, admin-only product writes, author-or-admin comment
//! mutation, and an atomic stock decrement that refuses underflow.
//!
//! Test levers: [`MockBackend::fail_next`] injects a remote failure into
//! the next row operation, [`MockBackend::suppress_echo`] makes product
//! writes return no row (degraded-path testing), and
//! [`MockBackend::require_email_confirmation`] withholds the session at
//! sign-up.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use shared::models::{
    CartLine, CartLineUpsert, Category, Comment, CommentDraft, FavoriteEntry, Product,
    ProductDraft, ProductPatch, Profile,
};
use shared::types::UserRole;
use shared::{AuthUser, Session, Timestamp, now_millis};

use vitrin_client::error::{ClientError, ClientResult};
use vitrin_client::service::{AuthService, DataService};

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    categories: Vec<Category>,
    cart: Vec<CartLine>,
    favorites: Vec<FavoriteEntry>,
    comments: Vec<Comment>,
    profiles: HashMap<String, Profile>,
    accounts: HashMap<String, Account>,
    reset_tokens: HashMap<String, String>,
    last_reset_token: Option<String>,
    session: Option<Session>,
    clock: Timestamp,
    fail_next: Option<String>,
    suppress_echo: bool,
    require_confirmation: bool,
}

impl Inner {
    /// Monotonic timestamp so insertion order is always recoverable
    fn tick(&mut self) -> Timestamp {
        self.clock += 1;
        self.clock
    }

    /// Consume a pending injected failure
    fn take_failure(&mut self) -> ClientResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(ClientError::Remote(message)),
            None => Ok(()),
        }
    }

    /// The identity behind the installed session's token
    fn actor(&self) -> ClientResult<(String, UserRole)> {
        let session = self.session.as_ref().ok_or(ClientError::Unauthorized)?;
        let role = self
            .profiles
            .get(&session.user.id)
            .map(|p| p.role)
            .unwrap_or_default();
        Ok((session.user.id.clone(), role))
    }

    fn require_admin(&self) -> ClientResult<String> {
        let (id, role) = self.actor()?;
        if !role.is_admin() {
            return Err(ClientError::Forbidden("admin role required".to_string()));
        }
        Ok(id)
    }

    /// Row-level visibility: callers only touch their own rows
    fn require_self(&self, user_id: &str) -> ClientResult<()> {
        let (actor_id, _) = self.actor()?;
        if actor_id != user_id {
            return Err(ClientError::Forbidden("row not visible".to_string()));
        }
        Ok(())
    }

    /// Populate the joined category name on a product row
    fn join_category(&self, mut product: Product) -> Product {
        product.category_name = product
            .category_id
            .as_ref()
            .and_then(|id| self.categories.iter().find(|c| &c.id == id))
            .map(|c| c.name.clone());
        product
    }

    fn mint_session(&self, account_id: &str, email: &str) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(now_millis() + 3_600_000),
            user: AuthUser {
                id: account_id.to_string(),
                email: email.to_string(),
                email_confirmed: true,
            },
        }
    }
}

/// In-memory backend implementing both service traits
pub struct MockBackend {
    inner: RwLock<Inner>,
    events: watch::Sender<Option<Session>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        let (events, _) = watch::channel(None);
        let inner = Inner {
            clock: now_millis(),
            ..Inner::default()
        };
        Self {
            inner: RwLock::new(inner),
            events,
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("mock state poisoned")
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("mock state poisoned")
    }

    fn install_session(&self, session: Option<Session>) {
        self.write().session = session.clone();
        let _ = self.events.send(session);
    }

    // ========== Test levers ==========

    /// The next row operation fails with a remote error
    pub fn fail_next(&self, message: &str) {
        self.write().fail_next = Some(message.to_string());
    }

    /// True while a failure injection is still pending (i.e., no row
    /// operation consumed it)
    pub fn failure_pending(&self) -> bool {
        self.read().fail_next.is_some()
    }

    /// Product insert/update stop echoing the written row
    pub fn suppress_echo(&self, on: bool) {
        self.write().suppress_echo = on;
    }

    /// Sign-up stops establishing a session until the email is confirmed
    pub fn require_email_confirmation(&self, on: bool) {
        self.write().require_confirmation = on;
    }

    /// Out-of-band confirmation, as if the emailed link was followed
    pub fn confirm_email(&self, email: &str) {
        if let Some(account) = self.write().accounts.get_mut(email) {
            account.confirmed = true;
        }
    }

    /// The token from the most recent reset email
    pub fn last_reset_token(&self) -> Option<String> {
        self.read().last_reset_token.clone()
    }

    // ========== Seeding helpers ==========

    /// Create a confirmed account with a profile row; returns the user id
    pub fn seed_user(&self, email: &str, password: &str) -> String {
        self.seed_account(email, password, UserRole::User)
    }

    /// Create a confirmed admin account; returns the user id
    pub fn seed_admin(&self, email: &str, password: &str) -> String {
        self.seed_account(email, password, UserRole::Admin)
    }

    fn seed_account(&self, email: &str, password: &str, role: UserRole) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.write();
        inner.accounts.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        inner.profiles.insert(
            id.clone(),
            Profile {
                id: id.clone(),
                email: email.to_string(),
                role,
            },
        );
        id
    }

    /// Role elevation happens out-of-band, never through the client
    pub fn promote_to_admin(&self, user_id: &str) {
        if let Some(profile) = self.write().profiles.get_mut(user_id) {
            profile.role = UserRole::Admin;
        }
    }

    // ========== Remote-state inspection (for assertions) ==========

    /// Number of category rows with this exact name
    pub fn category_rows_named(&self, name: &str) -> usize {
        self.read()
            .categories
            .iter()
            .filter(|c| c.name == name)
            .count()
    }

    /// Raw cart rows for a user, bypassing visibility rules
    pub fn cart_rows(&self, user_id: &str) -> Vec<CartLine> {
        self.read()
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect()
    }

    /// A product's current stock
    pub fn product_stock(&self, product_id: &str) -> Option<i64> {
        self.read()
            .products
            .iter()
            .find(|p| p.id == product_id)
            .and_then(|p| p.stock)
    }
}

// =============================================================================
// DataService
// =============================================================================

#[async_trait]
impl DataService for MockBackend {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let mut inner = self.write();
        inner.take_failure()?;
        let mut products: Vec<Product> = inner
            .products
            .iter()
            .map(|p| inner.join_category(p.clone()))
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn insert_product(&self, draft: &ProductDraft) -> ClientResult<Option<Product>> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_admin()?;

        let product = Product {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            price: draft.price,
            image: draft.image.clone(),
            stock: draft.stock,
            description: draft.description.clone(),
            category_id: draft.category_id.clone(),
            category_name: None,
            created_at: inner.tick(),
        };
        inner.products.push(product.clone());

        if inner.suppress_echo {
            return Ok(None);
        }
        Ok(Some(inner.join_category(product)))
    }

    async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> ClientResult<Option<Product>> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_admin()?;

        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))?;
        patch.apply_to(product);
        let updated = product.clone();

        if inner.suppress_echo {
            return Ok(None);
        }
        Ok(Some(inner.join_category(updated)))
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_admin()?;
        inner.products.retain(|p| p.id != id);
        Ok(())
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let mut inner = self.write();
        inner.take_failure()?;
        let mut categories = inner.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_name(&self, name: &str) -> ClientResult<Option<Category>> {
        let mut inner = self.write();
        inner.take_failure()?;
        let lowered = name.to_lowercase();
        Ok(inner
            .categories
            .iter()
            .find(|c| c.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn insert_category(&self, name: &str) -> ClientResult<Category> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_admin()?;
        // No unique constraint here, mirroring the modeled store: racing
        // ensures can create duplicate rows
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn list_cart_lines(&self, user_id: &str) -> ClientResult<Vec<CartLine>> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        let mut lines: Vec<CartLine> = inner
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(lines)
    }

    async fn upsert_cart_line(&self, upsert: &CartLineUpsert) -> ClientResult<CartLine> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(&upsert.user_id)?;

        let updated_at = inner.tick();
        // Merge on (user, product): the uniqueness the real table enforces
        if let Some(existing) = inner
            .cart
            .iter_mut()
            .find(|l| l.user_id == upsert.user_id && l.product_id == upsert.product_id)
        {
            existing.qty = upsert.qty;
            existing.updated_at = updated_at;
            return Ok(existing.clone());
        }

        let line = CartLine {
            user_id: upsert.user_id.clone(),
            product_id: upsert.product_id.clone(),
            qty: upsert.qty,
            updated_at,
        };
        inner.cart.push(line.clone());
        Ok(line)
    }

    async fn delete_cart_line(&self, user_id: &str, product_id: &str) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        inner
            .cart
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));
        Ok(())
    }

    async fn delete_cart_lines(&self, user_id: &str, product_ids: &[String]) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        inner
            .cart
            .retain(|l| !(l.user_id == user_id && product_ids.contains(&l.product_id)));
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> ClientResult<Vec<FavoriteEntry>> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        let mut entries: Vec<FavoriteEntry> = inner
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn insert_favorite(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> ClientResult<FavoriteEntry> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;

        if let Some(existing) = inner
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.product_id == product_id)
        {
            return Ok(existing.clone());
        }

        let created_at = inner.tick();
        let entry = FavoriteEntry {
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            created_at,
        };
        inner.favorites.push(entry.clone());
        Ok(entry)
    }

    async fn delete_favorite(&self, user_id: &str, product_id: &str) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        inner
            .favorites
            .retain(|f| !(f.user_id == user_id && f.product_id == product_id));
        Ok(())
    }

    async fn list_comments(&self, product_id: &str) -> ClientResult<Vec<Comment>> {
        let mut inner = self.write();
        inner.take_failure()?;
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, draft: &CommentDraft) -> ClientResult<Comment> {
        let mut inner = self.write();
        inner.take_failure()?;
        let (actor_id, _) = inner.actor()?;
        if actor_id != draft.author_id {
            return Err(ClientError::Forbidden(
                "author must be the signed-in user".to_string(),
            ));
        }

        let created_at = inner.tick();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            product_id: draft.product_id.clone(),
            author_id: draft.author_id.clone(),
            text: draft.text.clone(),
            created_at,
            updated_at: None,
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: &str, text: &str) -> ClientResult<Comment> {
        let mut inner = self.write();
        inner.take_failure()?;
        let (actor_id, role) = inner.actor()?;

        let updated_at = inner.tick();
        let comment = inner
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("comment {id}")))?;
        if comment.author_id != actor_id && !role.is_admin() {
            return Err(ClientError::Forbidden(
                "only the author or an admin may edit a comment".to_string(),
            ));
        }
        comment.text = text.to_string();
        comment.updated_at = Some(updated_at);
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: &str) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        let (actor_id, role) = inner.actor()?;

        let comment = inner
            .comments
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("comment {id}")))?;
        if comment.author_id != actor_id && !role.is_admin() {
            return Err(ClientError::Forbidden(
                "only the author or an admin may delete a comment".to_string(),
            ));
        }
        inner.comments.retain(|c| c.id != id);
        Ok(())
    }

    async fn upsert_profile(&self, user_id: &str, email: &str) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;

        // Idempotent: a second upsert never resets the role
        match inner.profiles.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().email = email.to_string(),
            Entry::Vacant(entry) => {
                entry.insert(Profile {
                    id: user_id.to_string(),
                    email: email.to_string(),
                    role: UserRole::default(),
                });
            }
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> ClientResult<Option<Profile>> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.require_self(user_id)?;
        Ok(inner.profiles.get(user_id).cloned())
    }

    async fn decrement_stock(&self, product_id: &str, qty: i64) -> ClientResult<()> {
        let mut inner = self.write();
        inner.take_failure()?;
        inner.actor()?;

        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| ClientError::NotFound(format!("product {product_id}")))?;
        match product.stock {
            Some(stock) if stock < qty => {
                Err(ClientError::Validation("insufficient stock".to_string()))
            }
            Some(stock) => {
                product.stock = Some(stock - qty);
                Ok(())
            }
            // Unspecified stock is not tracked
            None => Ok(()),
        }
    }
}

// =============================================================================
// AuthService
// =============================================================================

#[async_trait]
impl AuthService for MockBackend {
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Option<Session>> {
        let session = {
            let mut inner = self.write();
            if inner.accounts.contains_key(email) {
                return Err(ClientError::EmailTaken);
            }
            let id = Uuid::new_v4().to_string();
            let confirmed = !inner.require_confirmation;
            inner.accounts.insert(
                email.to_string(),
                Account {
                    id: id.clone(),
                    password: password.to_string(),
                    confirmed,
                },
            );
            if !confirmed {
                return Ok(None);
            }
            inner.mint_session(&id, email)
        };
        self.install_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        let session = {
            let mut inner = self.write();
            let account = inner
                .accounts
                .get(email)
                .cloned()
                .ok_or(ClientError::InvalidCredentials)?;
            if account.password != password {
                return Err(ClientError::InvalidCredentials);
            }
            if !account.confirmed {
                return Err(ClientError::EmailNotConfirmed);
            }
            inner.mint_session(&account.id, email)
        };
        self.install_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.install_session(None);
        Ok(())
    }

    async fn send_reset_email(&self, email: &str) -> ClientResult<()> {
        let mut inner = self.write();
        // Never reveal whether the account exists
        if inner.accounts.contains_key(email) {
            let token = Uuid::new_v4().to_string();
            inner.reset_tokens.insert(token.clone(), email.to_string());
            inner.last_reset_token = Some(token);
        }
        Ok(())
    }

    async fn exchange_token(&self, token: &str) -> ClientResult<Session> {
        let session = {
            let mut inner = self.write();
            let email = inner
                .reset_tokens
                .remove(token)
                .ok_or(ClientError::Unauthorized)?;
            let account = inner
                .accounts
                .get_mut(&email)
                .ok_or(ClientError::Unauthorized)?;
            // Following the reset link also proves the address
            account.confirmed = true;
            let id = account.id.clone();
            inner.mint_session(&id, &email)
        };
        self.install_session(Some(session.clone()));
        Ok(session)
    }

    async fn update_password(&self, new_password: &str) -> ClientResult<()> {
        let mut inner = self.write();
        let email = inner
            .session
            .as_ref()
            .map(|s| s.user.email.clone())
            .ok_or(ClientError::Unauthorized)?;
        let account = inner
            .accounts
            .get_mut(&email)
            .ok_or(ClientError::Unauthorized)?;
        account.password = new_password.to_string();
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.events.subscribe()
    }

    fn set_session(&self, session: Option<Session>) {
        self.install_session(session);
    }
}
