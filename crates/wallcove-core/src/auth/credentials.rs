//! Secure credential storage.
//!
//! Tokens and the signed-in user id live in the OS keychain via the
//! `keyring` crate. `MemoryStore` backs tests and headless environments
//! where no keychain is available.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

/// Keychain service name under which all wallcove entries are filed.
const SERVICE_NAME: &str = "wallcove";

/// Storage key for the bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage key for the signed-in user's id.
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value storage for secrets.
///
/// Calls are synchronous: keychain reads are fast local IPC, and callers
/// on async tasks tolerate the blip the same way they tolerate file IO.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// OS keychain-backed store.
pub struct KeyringStore;

impl KeyringStore {
    fn entry(key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, key)?)
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::entry(key)?.set_password(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            // Deleting an absent key is a no-op, matching the contract that
            // logout never fails on an already-clean keychain.
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and keychain-less environments.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panicked writer leaves plain strings behind, still safe to read
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());

        store.set(AUTH_TOKEN_KEY, "abc123").unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("abc123"));

        store.delete(AUTH_TOKEN_KEY).unwrap();
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());

        // Deleting again is fine
        store.delete(AUTH_TOKEN_KEY).unwrap();
    }
}
