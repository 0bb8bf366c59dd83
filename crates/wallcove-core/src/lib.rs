//! Core library for wallcove - a mobile wallpaper browsing app.
//!
//! The platform shells embed this crate for everything that is not UI:
//!
//! - `api` - authenticated HTTP client with retries, failure
//!   normalization, and coordinated session invalidation
//! - `auth` - credential storage and the login/logout session lifecycle
//! - `models` - wire types shared with the backend
//! - `config` - environment-driven configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use api::{user_message, ApiClient, ApiError, LoggingNotifier, LogoutCallback, SessionNotifier};
pub use auth::{
    AuthSession, AuthStatus, CredentialStore, KeyringStore, LoginOutcome, MemoryStore,
    SessionState, AUTH_TOKEN_KEY, USER_ID_KEY,
};
pub use config::Config;

/// Initialize the tracing subscriber for logging
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Everything a shell needs to talk to the backend, wired together.
pub struct AppContext {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub session: Arc<AuthSession>,
}

impl AppContext {
    /// Build the client and session against the given configuration and
    /// storage. A failed session restore is logged and leaves the session
    /// `Unknown`; the app still starts and can offer the login screen.
    pub async fn initialize(
        config: Config,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config, store.clone(), notifier)?);
        let session = AuthSession::new(api.clone(), store).await;

        if let Err(e) = session.initialize().await {
            warn!(error = %e, "Failed to restore persisted session");
        }

        Ok(Self {
            config,
            api,
            session,
        })
    }

    /// Standard wiring: environment config, OS keychain, log-only session
    /// notifications.
    pub async fn initialize_default() -> Result<Self> {
        Self::initialize(
            Config::from_env(),
            Arc::new(KeyringStore),
            Arc::new(LoggingNotifier),
        )
        .await
    }
}
