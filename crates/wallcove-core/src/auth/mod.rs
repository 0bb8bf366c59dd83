//! Authentication: secure credential storage and the session lifecycle.
//!
//! - `credentials` - keychain-backed key-value storage for secrets
//! - `token` - JWT payload inspection (reads the user id claim)
//! - `session` - tri-state auth session with login/logout and restore

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::{
    CredentialStore, KeyringStore, MemoryStore, StoreError, AUTH_TOKEN_KEY, USER_ID_KEY,
};
pub use session::{AuthSession, AuthStatus, LoginOutcome, SessionState, LOGIN_FAILED_MESSAGE};
pub use token::{extract_user_id, TokenError};
