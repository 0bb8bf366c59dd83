//! Shared pipeline state and the session-invalidation procedure.
//!
//! Any request can discover the session has died, either through a 401 or
//! through a soft-failure body that names the token. Every discovery
//! funnels into `begin_session_invalidation`, which guarantees that the
//! user notification and the registered logout callback run at most once
//! per invalidation no matter how many requests fail at the same moment.
//!
//! The failing request never waits on that work; it gets its error back
//! immediately while the logout runs in the background.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::SESSION_ENDED_MESSAGE;

/// Async logout hook registered by the auth layer.
/// Runs at most once per session invalidation.
pub type LogoutCallback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Receives the session-ended notice so the shell can surface it.
///
/// Implementations may await user acknowledgment; the logout callback only
/// runs after this returns.
#[async_trait]
pub trait SessionNotifier: Send + Sync {
    async fn session_ended(&self, message: &str);
}

/// Default notifier for headless use: logs the notice and moves on.
pub struct LoggingNotifier;

#[async_trait]
impl SessionNotifier for LoggingNotifier {
    async fn session_ended(&self, message: &str) {
        warn!("Session ended: {}", message);
    }
}

/// State shared by every clone of the client.
pub(crate) struct PipelineShared {
    /// Number of requests currently in flight (spinner hint for shells).
    pub(crate) in_flight: AtomicUsize,
    /// Set while a session invalidation is being handled; gates the
    /// notification and logout callback to a single run.
    pub(crate) logout_pending: AtomicBool,
    /// Single slot: a later registration replaces the earlier one.
    pub(crate) logout_callback: Mutex<Option<LogoutCallback>>,
    pub(crate) notifier: Arc<dyn SessionNotifier>,
}

impl PipelineShared {
    pub(crate) fn new(notifier: Arc<dyn SessionNotifier>) -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            logout_pending: AtomicBool::new(false),
            logout_callback: Mutex::new(None),
            notifier,
        })
    }
}

/// Clears the pending-logout latch when the invalidation task finishes,
/// even if the notifier or callback panics. A new invalidation can then
/// start if the session dies again later.
struct LatchReset(Arc<PipelineShared>);

impl Drop for LatchReset {
    fn drop(&mut self) {
        self.0.logout_pending.store(false, Ordering::SeqCst);
    }
}

/// Counts a request against the in-flight total for as long as it lives.
/// Dropping the request future drops the guard, so a caller that abandons
/// a request mid-way does not leave the count raised.
pub(crate) struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Start the session-invalidation procedure unless one is already running.
pub(crate) fn begin_session_invalidation(shared: &Arc<PipelineShared>, reason: &'static str) {
    if shared.logout_pending.swap(true, Ordering::SeqCst) {
        debug!(reason, "Session invalidation already pending, skipping");
        return;
    }

    warn!(reason, "Session invalidated, scheduling logout");
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let _reset = LatchReset(Arc::clone(&shared));

        shared.notifier.session_ended(SESSION_ENDED_MESSAGE).await;

        let callback = { shared.logout_callback.lock().await.clone() };
        match callback {
            Some(callback) => {
                if let Err(e) = callback().await {
                    warn!(error = %e, "Logout callback failed");
                }
            }
            None => debug!("Session invalidated with no logout callback registered"),
        }
    });
}
