//! Auth session manager
//!
//! Single source of truth for "who is signed in and with what role".
//! Hydrates from the persisted session cache, resolves the user's role
//! from their profile row, and hands a cloneable [`SessionHandle`] to the
//! stores so they can gate mutators and read the bearer token without a
//! network round trip.

use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::warn;

use shared::types::UserRole;
use shared::Session;

use crate::error::{ClientError, ClientResult};
use crate::service::{AuthService, DataService};
use crate::session_cache::SessionCache;

/// Signed-in identity with its resolved role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

/// Three-state auth status.
///
/// `Unknown` lasts only until the first resolution completes; consumers
/// must not redirect unauthenticated users while the status is `Unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Unknown,
    Authenticated(CurrentUser),
    Unauthenticated,
}

/// Outcome of a login attempt. Provider failures are classified here so
/// callers branch on variants instead of catching errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(CurrentUser),
    EmailNotConfirmed,
    InvalidCredentials,
    Failed(String),
}

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    SignedIn(CurrentUser),
    /// Account created; the provider wants the email confirmed before any
    /// session is established
    ConfirmationRequired,
    EmailTaken,
    Failed(String),
}

#[derive(Debug, Default)]
struct HandleState {
    status: AuthStatus,
    token: Option<String>,
}

/// Cheap cloneable view of the session state, injected into the stores
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<HandleState>>,
}

impl SessionHandle {
    pub fn status(&self) -> AuthStatus {
        self.inner.read().expect("session state poisoned").status.clone()
    }

    /// True once the initial resolution has settled out of `Unknown`
    pub fn is_hydrated(&self) -> bool {
        !matches!(self.status(), AuthStatus::Unknown)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        match self.status() {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Bearer token for outbound requests; no network involved
    pub fn access_token(&self) -> Option<String> {
        self.inner.read().expect("session state poisoned").token.clone()
    }

    /// The signed-in user, or `AuthRequired` for unauthenticated callers
    pub fn require_user(&self) -> ClientResult<CurrentUser> {
        self.current_user().ok_or(ClientError::AuthRequired)
    }

    fn set(&self, status: AuthStatus, token: Option<String>) {
        let mut state = self.inner.write().expect("session state poisoned");
        state.status = status;
        state.token = token;
    }
}

/// Owns session lifecycle: hydration, login/registration, logout, and the
/// password reset flow.
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    data: Arc<dyn DataService>,
    cache: SessionCache,
    handle: SessionHandle,
    status_tx: watch::Sender<AuthStatus>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthService>, data: Arc<dyn DataService>, cache: SessionCache) -> Self {
        let (status_tx, _) = watch::channel(AuthStatus::Unknown);
        Self {
            auth,
            data,
            cache,
            handle: SessionHandle::default(),
            status_tx,
        }
    }

    /// Cloneable session view for the stores
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Status notifications, starting from `Unknown`
    pub fn watch_status(&self) -> watch::Receiver<AuthStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> AuthStatus {
        self.handle.status()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.handle.current_user()
    }

    /// Synchronous bearer access for outbound requests
    pub fn access_token(&self) -> Option<String> {
        self.handle.access_token()
    }

    /// Hydrate from the persisted session, if any.
    ///
    /// The status always settles out of `Unknown` before this returns:
    /// missing/expired/rejected sessions settle `Unauthenticated`, and
    /// profile-resolution failures other than a token rejection fall back
    /// to the default role rather than blocking hydration.
    pub async fn initialize(&self) {
        let cached = self.cache.load().filter(|s| !s.is_expired());
        let Some(session) = cached else {
            self.set_unauthenticated();
            return;
        };

        self.auth.set_session(Some(session.clone()));
        match self.resolve_session(&session).await {
            Ok(user) => self.set_authenticated(user, &session),
            Err(_) => {
                warn!("cached session rejected by remote, discarding");
                if let Err(e) = self.cache.clear() {
                    warn!(error = %e, "failed to clear session cache");
                }
                self.auth.set_session(None);
                self.set_unauthenticated();
            }
        }
    }

    /// Forward provider session events (token refresh, sign-in or
    /// sign-out observed elsewhere) into [`Self::handle_session_change`]
    /// on a background task. Call once after [`Self::initialize`].
    pub fn spawn_session_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut events = manager.auth.subscribe();
        tokio::spawn(async move {
            while events.changed().await.is_ok() {
                let session = events.borrow_and_update().clone();
                manager.handle_session_change(session).await;
            }
        })
    }

    /// Re-run resolution for a provider session event. The listener from
    /// [`Self::spawn_session_listener`] drives this; it is public so a
    /// host with its own event loop can drive it directly.
    pub async fn handle_session_change(&self, session: Option<Session>) {
        match session {
            Some(session) => match self.resolve_session(&session).await {
                Ok(user) => {
                    if let Err(e) = self.cache.save(&session) {
                        warn!(error = %e, "failed to persist session");
                    }
                    self.set_authenticated(user, &session);
                }
                Err(_) => {
                    if let Err(e) = self.cache.clear() {
                        warn!(error = %e, "failed to clear session cache");
                    }
                    self.set_unauthenticated();
                }
            },
            None => {
                if let Err(e) = self.cache.clear() {
                    warn!(error = %e, "failed to clear session cache");
                }
                self.set_unauthenticated();
            }
        }
    }

    /// Exchange credentials for a session. Never returns an error; the
    /// caller branches on the outcome.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        match self.auth.sign_in(email, password).await {
            Ok(session) => {
                if let Err(e) = self.cache.save(&session) {
                    warn!(error = %e, "failed to persist session");
                }
                match self.resolve_session(&session).await {
                    Ok(user) => {
                        self.set_authenticated(user.clone(), &session);
                        LoginOutcome::Success(user)
                    }
                    Err(e) => {
                        warn!(error = %e, "post-login profile resolution failed");
                        self.set_unauthenticated();
                        LoginOutcome::Failed(e.to_string())
                    }
                }
            }
            Err(ClientError::EmailNotConfirmed) => LoginOutcome::EmailNotConfirmed,
            Err(ClientError::InvalidCredentials) | Err(ClientError::Unauthorized) => {
                LoginOutcome::InvalidCredentials
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                LoginOutcome::Failed(e.to_string())
            }
        }
    }

    /// Create an account. When the provider requires email confirmation
    /// the status stays unauthenticated and the caller should tell the
    /// user to check their inbox.
    pub async fn register(&self, email: &str, password: &str) -> RegisterOutcome {
        match self.auth.sign_up(email, password).await {
            Ok(Some(session)) => {
                if let Err(e) = self.cache.save(&session) {
                    warn!(error = %e, "failed to persist session");
                }
                match self.resolve_session(&session).await {
                    Ok(user) => {
                        self.set_authenticated(user.clone(), &session);
                        RegisterOutcome::SignedIn(user)
                    }
                    Err(e) => {
                        warn!(error = %e, "post-registration profile resolution failed");
                        self.set_unauthenticated();
                        RegisterOutcome::Failed(e.to_string())
                    }
                }
            }
            Ok(None) => {
                self.set_unauthenticated();
                RegisterOutcome::ConfirmationRequired
            }
            Err(ClientError::EmailTaken) => RegisterOutcome::EmailTaken,
            Err(e) => {
                warn!(error = %e, "registration failed");
                RegisterOutcome::Failed(e.to_string())
            }
        }
    }

    /// Invalidate the remote session and clear local state. The local
    /// side clears even when the remote call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.auth.sign_out().await {
            warn!(error = %e, "remote sign-out failed");
        }
        if let Err(e) = self.cache.clear() {
            warn!(error = %e, "failed to clear session cache");
        }
        self.set_unauthenticated();
    }

    /// Ask the provider to email a password reset link
    pub async fn send_reset_email(&self, email: &str) -> ClientResult<()> {
        self.auth.send_reset_email(email).await
    }

    /// Finish a password reset: the token from the callback URL is
    /// exchanged for a session before the password update.
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> ClientResult<CurrentUser> {
        let session = self.auth.exchange_token(token).await?;
        self.auth.update_password(new_password).await?;
        if let Err(e) = self.cache.save(&session) {
            warn!(error = %e, "failed to persist session");
        }
        let user = self.resolve_session(&session).await?;
        self.set_authenticated(user.clone(), &session);
        Ok(user)
    }

    /// Idempotent profile upsert plus role resolution.
    ///
    /// Only a token rejection is fatal; every other failure falls back to
    /// the default role so hydration still settles.
    async fn resolve_session(&self, session: &Session) -> ClientResult<CurrentUser> {
        match self.data.upsert_profile(&session.user.id, &session.user.email).await {
            Ok(()) => {}
            Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
            Err(e) => warn!(error = %e, "profile upsert failed, continuing"),
        }

        let role = match self.data.fetch_profile(&session.user.id).await {
            Ok(Some(profile)) => profile.role,
            Ok(None) => {
                warn!(user = %session.user.id, "profile row missing, defaulting role");
                UserRole::User
            }
            Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
            Err(e) => {
                warn!(error = %e, "profile fetch failed, defaulting role");
                UserRole::User
            }
        };

        Ok(CurrentUser {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            role,
        })
    }

    fn set_authenticated(&self, user: CurrentUser, session: &Session) {
        self.handle.set(
            AuthStatus::Authenticated(user.clone()),
            Some(session.access_token.clone()),
        );
        let _ = self.status_tx.send(AuthStatus::Authenticated(user));
    }

    fn set_unauthenticated(&self) {
        self.handle.set(AuthStatus::Unauthenticated, None);
        let _ = self.status_tx.send(AuthStatus::Unauthenticated);
    }
}
