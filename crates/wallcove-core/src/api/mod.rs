//! API layer for the wallcove backend.
//!
//! - `client` - authenticated HTTP client with retries and failure
//!   normalization
//! - `error` - typed failures and the stable user-facing messages
//! - `pipeline` - shared request state and the session-invalidation
//!   procedure

pub mod client;
pub mod error;
pub mod pipeline;

pub use client::ApiClient;
pub use error::{user_message, ApiError};
pub use pipeline::{LoggingNotifier, LogoutCallback, SessionNotifier};
