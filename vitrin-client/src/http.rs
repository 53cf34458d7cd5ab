//! HTTP implementation of the remote service seam
//!
//! Talks to a hosted relational store: row operations under `/rest/v1`
//! with filter/order query parameters and `Prefer` write echoes, remote
//! procedures under `/rest/v1/rpc`, and the auth subsystem under
//! `/auth/v1`.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use shared::models::{
    CartLine, CartLineUpsert, Category, Comment, CommentDraft, FavoriteEntry, Product,
    ProductDraft, ProductPatch, Profile,
};
use shared::{AuthUser, Session, Timestamp, now_millis};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::service::{AuthService, DataService};

/// Joined column list requested for every product read/echo
const PRODUCT_SELECT: &str =
    "id,title,price,image,stock,description,category_id,created_at,categories(name)";

/// HTTP client for the remote data service
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    events: watch::Sender<Option<Session>>,
}

impl RestClient {
    /// Create a new client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");
        let (events, _) = watch::channel(None);

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session: RwLock::new(None),
            events,
        }
    }

    /// The bearer sent with row operations: session token if signed in,
    /// the publishable key otherwise
    fn bearer(&self) -> String {
        self.session
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn install_session(&self, session: Option<Session>) {
        *self.session.write().expect("session lock poisoned") = session.clone();
        // Receivers may have all dropped; that is fine
        let _ = self.events.send(session);
    }

    fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.request(method, url)
    }

    fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/auth/v1/{}", self.base_url, path);
        self.request(method, url)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.bearer()),
            )
    }

    /// Map an unsuccessful status to the error taxonomy
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Validation(text))
                }
                _ => Err(ClientError::Remote(text)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    /// Like [`Self::handle_response`] but for writes that return no body
    async fn handle_empty(response: reqwest::Response) -> ClientResult<()> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Validation(text))
                }
                _ => Err(ClientError::Remote(text)),
            };
        }
        Ok(())
    }

    /// Auth endpoints report failures as JSON bodies on 400/422; classify
    /// the provider's message into the typed variants the session manager
    /// branches on
    async fn handle_auth_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return ClientError::Unauthorized;
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AuthErrorBody>(&text)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or(text);
        classify_auth_message(message)
    }

    async fn auth_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.auth(method, path).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Self::handle_auth_error(response).await);
        }
        response.json().await.map_err(Into::into)
    }
}

/// Map a provider error message onto the typed variants the session
/// manager branches on
fn classify_auth_message(message: String) -> ClientError {
    let lowered = message.to_lowercase();
    if lowered.contains("not confirmed") {
        ClientError::EmailNotConfirmed
    } else if lowered.contains("invalid login") || lowered.contains("invalid credentials") {
        ClientError::InvalidCredentials
    } else if lowered.contains("already registered") || lowered.contains("already exists") {
        ClientError::EmailTaken
    } else {
        ClientError::Remote(message)
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

/// Product row as the store returns it, with the joined category nested
#[derive(Debug, Deserialize)]
struct ProductRow {
    id: String,
    title: String,
    price: Decimal,
    image: Option<String>,
    stock: Option<i64>,
    description: Option<String>,
    category_id: Option<String>,
    created_at: Timestamp,
    #[serde(default)]
    categories: Option<JoinedCategoryName>,
}

#[derive(Debug, Deserialize)]
struct JoinedCategoryName {
    name: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            title: row.title,
            price: row.price,
            image: row.image,
            stock: row.stock,
            description: row.description,
            category_id: row.category_id,
            category_name: row.categories.map(|c| c.name),
            created_at: row.created_at,
        }
    }
}

/// Token grant / verify response from the auth subsystem
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| now_millis() + secs * 1_000),
            user: self.user,
        }
    }
}

/// Signup response: a session when no confirmation is required, otherwise
/// just the pending user
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

// =============================================================================
// DataService over HTTP
// =============================================================================

#[async_trait]
impl DataService for RestClient {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let response = self
            .rest(Method::GET, "products")
            .query(&[("select", PRODUCT_SELECT), ("order", "created_at.desc")])
            .send()
            .await?;
        let rows: Vec<ProductRow> = Self::handle_response(response).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_product(&self, draft: &ProductDraft) -> ClientResult<Option<Product>> {
        let response = self
            .rest(Method::POST, "products")
            .query(&[("select", PRODUCT_SELECT)])
            .header("Prefer", "return=representation")
            .json(draft)
            .send()
            .await?;
        let rows: Vec<ProductRow> = Self::handle_response(response).await?;
        Ok(rows.into_iter().next().map(Product::from))
    }

    async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> ClientResult<Option<Product>> {
        let response = self
            .rest(Method::PATCH, "products")
            .query(&[("id", format!("eq.{id}")), ("select", PRODUCT_SELECT.into())])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        let rows: Vec<ProductRow> = Self::handle_response(response).await?;
        Ok(rows.into_iter().next().map(Product::from))
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        let response = self
            .rest(Method::DELETE, "products")
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let response = self
            .rest(Method::GET, "categories")
            .query(&[("select", "*"), ("order", "name.asc")])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn find_category_by_name(&self, name: &str) -> ClientResult<Option<Category>> {
        let response = self
            .rest(Method::GET, "categories")
            .query(&[
                ("select", "*".to_string()),
                ("name", format!("ilike.{name}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<Category> = Self::handle_response(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_category(&self, name: &str) -> ClientResult<Category> {
        let response = self
            .rest(Method::POST, "categories")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        let rows: Vec<Category> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("missing inserted category".to_string()))
    }

    async fn list_cart_lines(&self, user_id: &str) -> ClientResult<Vec<CartLine>> {
        let response = self
            .rest(Method::GET, "cart_items")
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "updated_at.desc".to_string()),
            ])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn upsert_cart_line(&self, upsert: &CartLineUpsert) -> ClientResult<CartLine> {
        let response = self
            .rest(Method::POST, "cart_items")
            .query(&[("on_conflict", "user_id,product_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(upsert)
            .send()
            .await?;
        let rows: Vec<CartLine> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("missing upserted cart line".to_string()))
    }

    async fn delete_cart_line(&self, user_id: &str, product_id: &str) -> ClientResult<()> {
        let response = self
            .rest(Method::DELETE, "cart_items")
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("product_id", format!("eq.{product_id}")),
            ])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn delete_cart_lines(&self, user_id: &str, product_ids: &[String]) -> ClientResult<()> {
        if product_ids.is_empty() {
            return Ok(());
        }
        let response = self
            .rest(Method::DELETE, "cart_items")
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("product_id", format!("in.({})", product_ids.join(","))),
            ])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn list_favorites(&self, user_id: &str) -> ClientResult<Vec<FavoriteEntry>> {
        let response = self
            .rest(Method::GET, "favorites")
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert_favorite(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> ClientResult<FavoriteEntry> {
        let response = self
            .rest(Method::POST, "favorites")
            .query(&[("on_conflict", "user_id,product_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&serde_json::json!({ "user_id": user_id, "product_id": product_id }))
            .send()
            .await?;
        let rows: Vec<FavoriteEntry> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("missing favorite row".to_string()))
    }

    async fn delete_favorite(&self, user_id: &str, product_id: &str) -> ClientResult<()> {
        let response = self
            .rest(Method::DELETE, "favorites")
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("product_id", format!("eq.{product_id}")),
            ])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn list_comments(&self, product_id: &str) -> ClientResult<Vec<Comment>> {
        let response = self
            .rest(Method::GET, "comments")
            .query(&[
                ("select", "*".to_string()),
                ("product_id", format!("eq.{product_id}")),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert_comment(&self, draft: &CommentDraft) -> ClientResult<Comment> {
        let response = self
            .rest(Method::POST, "comments")
            .header("Prefer", "return=representation")
            .json(draft)
            .send()
            .await?;
        let rows: Vec<Comment> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("missing inserted comment".to_string()))
    }

    async fn update_comment(&self, id: &str, text: &str) -> ClientResult<Comment> {
        let response = self
            .rest(Method::PATCH, "comments")
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "text": text, "updated_at": now_millis() }))
            .send()
            .await?;
        let rows: Vec<Comment> = Self::handle_response(response).await?;
        // Row-level rules silently filter rows the caller may not touch;
        // an empty echo on an existing comment means the write was denied
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::Forbidden("comment not updatable".to_string()))
    }

    async fn delete_comment(&self, id: &str) -> ClientResult<()> {
        let response = self
            .rest(Method::DELETE, "comments")
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn upsert_profile(&self, user_id: &str, email: &str) -> ClientResult<()> {
        let response = self
            .rest(Method::POST, "profiles")
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&serde_json::json!({ "id": user_id, "email": email }))
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn fetch_profile(&self, user_id: &str) -> ClientResult<Option<Profile>> {
        let response = self
            .rest(Method::GET, "profiles")
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<Profile> = Self::handle_response(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn decrement_stock(&self, product_id: &str, qty: i64) -> ClientResult<()> {
        let response = self
            .rest(Method::POST, "rpc/decrement_stock")
            .json(&serde_json::json!({ "product_id": product_id, "quantity": qty }))
            .send()
            .await?;
        Self::handle_empty(response).await
    }
}

// =============================================================================
// AuthService over HTTP
// =============================================================================

#[async_trait]
impl AuthService for RestClient {
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Option<Session>> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: SignUpResponse = self.auth_json(Method::POST, "signup", &body).await?;

        match (response.access_token, response.user) {
            (Some(access_token), Some(user)) => {
                let session = Session {
                    access_token,
                    refresh_token: response.refresh_token,
                    expires_at: response.expires_in.map(|secs| now_millis() + secs * 1_000),
                    user,
                };
                self.install_session(Some(session.clone()));
                Ok(Some(session))
            }
            // Confirmation pending: an account exists but no session yet
            _ => Ok(None),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: TokenResponse = self
            .auth_json(Method::POST, "token?grant_type=password", &body)
            .await?;
        let session = response.into_session();
        self.install_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        let response = self.auth(Method::POST, "logout").send().await?;
        // Local session is dropped regardless of the remote outcome
        self.install_session(None);
        Self::handle_empty(response).await
    }

    async fn send_reset_email(&self, email: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "email": email });
        let response = self.auth(Method::POST, "recover").json(&body).send().await?;
        Self::handle_empty(response).await
    }

    async fn exchange_token(&self, token: &str) -> ClientResult<Session> {
        let body = serde_json::json!({ "type": "recovery", "token": token });
        let response: TokenResponse = self.auth_json(Method::POST, "verify", &body).await?;
        let session = response.into_session();
        self.install_session(Some(session.clone()));
        Ok(session)
    }

    async fn update_password(&self, new_password: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "password": new_password });
        let response = self.auth(Method::PUT, "user").json(&body).send().await?;
        Self::handle_empty(response).await
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.events.subscribe()
    }

    fn set_session(&self, session: Option<Session>) {
        self.install_session(session);
    }
}
