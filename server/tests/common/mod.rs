#![allow(dead_code)]

use keygate_license::{
    LicenseEngine, LicenseRecord, LicenseStore, LicenseUpdate, MemoryLicenseStore, StoreResult,
};
use keygate_server::{AdminAccess, AppState, ServerConfig, build_router};
use keygate_throttle::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestServer {
    pub base: String,
    pub store: Arc<MemoryLicenseStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn admin_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }

    pub fn admin_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }

    pub fn admin_patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }
}

pub fn token_config() -> ServerConfig {
    ServerConfig {
        admin: AdminAccess::Token(ADMIN_TOKEN.to_string()),
        ..ServerConfig::default()
    }
}

pub fn limited_config(max_requests: u32) -> ServerConfig {
    ServerConfig {
        rate_limit: RateLimitConfig::new(max_requests, 60).unwrap(),
        ..token_config()
    }
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_test_server(config: ServerConfig) -> TestServer {
    let store = Arc::new(MemoryLicenseStore::new());
    let base = spawn_with_store(store.clone(), config).await;
    TestServer {
        base,
        store,
        client: reqwest::Client::new(),
    }
}

/// Spin up the HTTP server over any store, returning the base URL.
pub async fn spawn_with_store(store: Arc<dyn LicenseStore>, config: ServerConfig) -> String {
    let engine = LicenseEngine::new(store);
    let app = build_router(AppState::new(engine, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// Memory store whose lookups block the calling thread.
pub struct SlowStore {
    inner: MemoryLicenseStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryLicenseStore::new(),
            delay,
        }
    }
}

impl LicenseStore for SlowStore {
    fn insert_if_absent(&self, record: &LicenseRecord) -> StoreResult<()> {
        self.inner.insert_if_absent(record)
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<LicenseRecord>> {
        std::thread::sleep(self.delay);
        self.inner.find_by_key(key)
    }

    fn update_fields(
        &self,
        key: &str,
        update: &LicenseUpdate,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<LicenseRecord> {
        self.inner.update_fields(key, update, now)
    }

    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>> {
        self.inner.list_all()
    }
}
