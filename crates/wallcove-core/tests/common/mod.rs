// Shared harness for the integration tests: each test spins up a local
// axum server standing in for the wallcove backend and points a client
// at it.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::net::TcpListener;

use wallcove_core::auth::{AuthSession, StoreError};
use wallcove_core::{ApiClient, Config, CredentialStore, LoggingNotifier, MemoryStore};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Store that fails every operation, standing in for a locked keychain.
pub struct FailingStore;

impl CredentialStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }
}

/// Store that reads and deletes normally but accepts only a fixed number
/// of writes before failing, standing in for a keychain that goes
/// read-only or fills mid-operation. `new(0)` refuses every write.
pub struct WriteQuotaStore {
    inner: MemoryStore,
    writes_left: Mutex<u32>,
}

impl WriteQuotaStore {
    pub fn new(writes: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            writes_left: Mutex::new(writes),
        }
    }
}

impl CredentialStore for WriteQuotaStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut left = self.writes_left.lock().unwrap();
        if *left == 0 {
            return Err(StoreError::Unavailable("keychain is full".to_string()));
        }
        *left -= 1;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }
}

/// Serve `router` on an ephemeral local port and return its address.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("test server addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test server");
    });
    addr
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

pub fn client_for(addr: SocketAddr, store: Arc<dyn CredentialStore>) -> ApiClient {
    let config = Config::with_api_url(&base_url(addr));
    ApiClient::new(&config, store, Arc::new(LoggingNotifier)).expect("build client")
}

/// Client plus a session wired to it, the way `AppContext` does it.
pub async fn session_for(
    addr: SocketAddr,
    store: Arc<dyn CredentialStore>,
) -> (Arc<ApiClient>, Arc<AuthSession>) {
    let api = Arc::new(client_for(addr, store.clone()));
    let session = AuthSession::new(api.clone(), store).await;
    (api, session)
}
