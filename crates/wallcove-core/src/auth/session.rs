//! Auth session lifecycle.
//!
//! The session is tri-state: `Unknown` until persisted credentials have
//! been checked, then `Authenticated` or `Unauthenticated`. Login never
//! returns an error - callers always get a `LoginOutcome` they can show
//! the user - and logout always succeeds locally even when the keychain
//! misbehaves.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::api::error::{user_message, GENERIC_ERROR_MESSAGE};
use crate::api::ApiClient;
use crate::models::LoginResponse;

use super::credentials::{CredentialStore, AUTH_TOKEN_KEY, USER_ID_KEY};
use super::token::extract_user_id;

/// Shown when the server refuses a login without saying why.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Check your username and password.";

/// Full session state, including credentials when signed in.
/// `user_id` can be absent on restored sessions whose stored id predates
/// the current format or failed to parse; the token alone is enough to
/// make authenticated requests.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unknown,
    Unauthenticated,
    Authenticated {
        token: String,
        user_id: Option<i64>,
    },
}

/// Credential-free view of the session state, safe to hand to UI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unknown,
    Unauthenticated,
    Authenticated,
}

/// What came of a login attempt. `Failed` carries a message ready to
/// show the user.
#[derive(Debug)]
pub enum LoginOutcome {
    Success {
        user_id: i64,
        response: LoginResponse,
    },
    Failed {
        message: String,
    },
}

pub struct AuthSession {
    http: Arc<ApiClient>,
    store: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
}

impl AuthSession {
    /// Create the session and register it as the client's logout hook, so
    /// a server-side invalidation clears local state without the app
    /// wiring anything manually.
    pub async fn new(http: Arc<ApiClient>, store: Arc<dyn CredentialStore>) -> Arc<Self> {
        let session = Arc::new(Self {
            http: http.clone(),
            store,
            state: RwLock::new(SessionState::Unknown),
        });

        // Weak reference keeps a dropped session from being revived by a
        // late 401
        let weak = Arc::downgrade(&session);
        http.set_logout_callback(Arc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(session) = weak.upgrade() {
                    session.logout().await;
                }
                anyhow::Ok(())
            }
            .boxed()
        }))
        .await;

        session
    }

    /// Restore the persisted session, if any. On storage failure the state
    /// stays `Unknown` so the app can distinguish "signed out" from
    /// "could not check".
    pub async fn initialize(&self) -> Result<()> {
        let token = self
            .store
            .get(AUTH_TOKEN_KEY)
            .context("Failed to read stored auth token")?;

        let Some(token) = token else {
            *self.state.write().await = SessionState::Unauthenticated;
            return Ok(());
        };

        // A bad stored id is not worth losing the session over
        let user_id = match self.store.get(USER_ID_KEY) {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(raw = %raw, "Stored user id is not numeric, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user id");
                None
            }
        };

        *self.state.write().await = SessionState::Authenticated { token, user_id };
        Ok(())
    }

    /// Attempt a login. Never returns an error: every failure mode folds
    /// into `LoginOutcome::Failed` with a presentable message.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let response = match self.http.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return LoginOutcome::Failed {
                    message: user_message(&e),
                };
            }
        };

        let token = match response.token.as_deref() {
            Some(token) if response.status && !token.is_empty() => token.to_string(),
            _ => {
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
                return LoginOutcome::Failed { message };
            }
        };

        let user_id = match extract_user_id(&token) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Login token did not yield a user id");
                return LoginOutcome::Failed {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                };
            }
        };

        // A session that cannot be persisted is never entered; the caller
        // sees the same failure as any other broken login
        if let Err(e) = self.store.set(AUTH_TOKEN_KEY, &token) {
            warn!(error = %e, "Failed to persist auth token");
            return LoginOutcome::Failed {
                message: GENERIC_ERROR_MESSAGE.to_string(),
            };
        }
        if let Err(e) = self.store.set(USER_ID_KEY, &user_id.to_string()) {
            warn!(error = %e, "Failed to persist user id");
            // The token write already landed; remove it so the next launch
            // cannot restore a session this login never entered
            if let Err(e) = self.store.delete(AUTH_TOKEN_KEY) {
                warn!(error = %e, "Failed to remove half-persisted auth token");
            }
            return LoginOutcome::Failed {
                message: GENERIC_ERROR_MESSAGE.to_string(),
            };
        }

        *self.state.write().await = SessionState::Authenticated {
            token,
            user_id: Some(user_id),
        };
        info!(user_id, "Logged in");

        LoginOutcome::Success { user_id, response }
    }

    /// Sign out locally: drop stored credentials and mark the session
    /// unauthenticated. Keychain failures are logged, not surfaced -
    /// logout must always leave the app signed out.
    pub async fn logout(&self) {
        if let Err(e) = self.store.delete(AUTH_TOKEN_KEY) {
            warn!(error = %e, "Failed to delete stored auth token");
        }
        if let Err(e) = self.store.delete(USER_ID_KEY) {
            warn!(error = %e, "Failed to delete stored user id");
        }

        *self.state.write().await = SessionState::Unauthenticated;
        info!("Logged out");
    }

    pub async fn status(&self) -> AuthStatus {
        match *self.state.read().await {
            SessionState::Unknown => AuthStatus::Unknown,
            SessionState::Unauthenticated => AuthStatus::Unauthenticated,
            SessionState::Authenticated { .. } => AuthStatus::Authenticated,
        }
    }

    pub async fn token(&self) -> Option<String> {
        match &*self.state.read().await {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub async fn user_id(&self) -> Option<i64> {
        match &*self.state.read().await {
            SessionState::Authenticated { user_id, .. } => *user_id,
            _ => None,
        }
    }

    /// Full state clone, for code that needs the token and id together.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }
}
