use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, Method, StatusCode};
use secretdrop::{
    domain::{SecretKey, SecretRecord, SecretSummary, ViewEntry},
    errors::{Result, SecretDropError},
    storage::{InMemorySecretStore, SecretStore},
};
use serde_json::{json, Value};

use crate::common::{read_json, read_text, test_config, TestApp};

/// Store whose backend is unreachable
#[derive(Debug)]
struct UnavailableStore;

fn unavailable<T>() -> Result<T> {
    Err(SecretDropError::database(sqlx::Error::PoolTimedOut, "connection pool exhausted"))
}

#[async_trait]
impl SecretStore for UnavailableStore {
    async fn get(&self, _key: &SecretKey) -> Result<Option<SecretRecord>> {
        unavailable()
    }

    async fn put(&self, _record: SecretRecord) -> Result<()> {
        unavailable()
    }

    async fn delete(&self, _key: &SecretKey) -> Result<bool> {
        unavailable()
    }

    async fn list(&self) -> Result<Vec<SecretSummary>> {
        unavailable()
    }

    async fn append_viewer(&self, _key: &SecretKey, _entry: ViewEntry) -> Result<()> {
        unavailable()
    }

    async fn view_log(&self, _key: &SecretKey) -> Result<Option<Vec<ViewEntry>>> {
        unavailable()
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }

    async fn health_check(&self) -> Result<()> {
        unavailable()
    }
}

/// Store that serves records but cannot write to the view log
#[derive(Debug, Default)]
struct ViewLogDownStore {
    inner: InMemorySecretStore,
}

#[async_trait]
impl SecretStore for ViewLogDownStore {
    async fn get(&self, key: &SecretKey) -> Result<Option<SecretRecord>> {
        self.inner.get(key).await
    }

    async fn put(&self, record: SecretRecord) -> Result<()> {
        self.inner.put(record).await
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn list(&self) -> Result<Vec<SecretSummary>> {
        self.inner.list().await
    }

    async fn append_viewer(&self, _key: &SecretKey, _entry: ViewEntry) -> Result<()> {
        unavailable()
    }

    async fn view_log(&self, key: &SecretKey) -> Result<Option<Vec<ViewEntry>>> {
        self.inner.view_log(key).await
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[tokio::test]
async fn fetch_succeeds_when_viewer_cannot_be_recorded() {
    let app = TestApp::with_store(Arc::new(ViewLogDownStore::default()), test_config());
    app.seed_example().await;

    let response = app.get("/api/secret/abc123?viewerId=7").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"type": "text", "content": "hello", "uploaderId": 42}));

    let response = app.as_admin(Method::GET, "/api/admin/secrets").await;
    let body: Value = read_json(response).await;
    assert_eq!(body["abc123"]["viewCount"], 0);
}

/// Store that never answers a read in time
#[derive(Debug, Default)]
struct StalledStore {
    inner: InMemorySecretStore,
}

#[async_trait]
impl SecretStore for StalledStore {
    async fn get(&self, key: &SecretKey) -> Result<Option<SecretRecord>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        self.inner.get(key).await
    }

    async fn put(&self, record: SecretRecord) -> Result<()> {
        self.inner.put(record).await
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn list(&self) -> Result<Vec<SecretSummary>> {
        self.inner.list().await
    }

    async fn append_viewer(&self, key: &SecretKey, entry: ViewEntry) -> Result<()> {
        self.inner.append_viewer(key, entry).await
    }

    async fn view_log(&self, key: &SecretKey) -> Result<Option<Vec<ViewEntry>>> {
        self.inner.view_log(key).await
    }

    fn backend_name(&self) -> &'static str {
        "stalled"
    }
}

#[tokio::test(start_paused = true)]
async fn slow_requests_time_out_with_408() {
    let mut config = test_config();
    config.api.timeout_seconds = 1;
    let app = TestApp::with_store(Arc::new(StalledStore::default()), config);

    let response = app.get("/api/secret/abc123").await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    // Routes that skip the store still answer
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn fetches_are_rate_limited_per_peer() {
    let mut config = test_config();
    config.api.fetch_rate_limit_per_minute = 2;
    let app = TestApp::with_config(config);
    app.seed_example().await;

    assert_eq!(app.get("/api/secret/abc123").await.status(), StatusCode::OK);
    assert_eq!(app.get("/api/secret/zzz999").await.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/secret/abc123").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u32 = response.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: Value = read_json(response).await;
    assert_eq!(body["code"], "rate_limited");

    // Admin routes are not throttled by the fetch limiter
    assert_eq!(app.as_admin(Method::GET, "/api/admin/secrets").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn forwarded_clients_get_their_own_budget() {
    let mut config = test_config();
    config.api.fetch_rate_limit_per_minute = 1;
    config.api.trusted_proxy_depth = 1;
    let app = TestApp::with_config(config);
    app.seed_example().await;

    assert_eq!(fetch_as(&app, "198.51.100.1").await, StatusCode::OK);
    assert_eq!(fetch_as(&app, "198.51.100.1").await, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(fetch_as(&app, "198.51.100.2").await, StatusCode::OK);

    // Rotating addresses inside one IPv6 /64 does not buy more requests
    assert_eq!(fetch_as(&app, "2001:db8:1:2::1").await, StatusCode::OK);
    assert_eq!(fetch_as(&app, "2001:db8:1:2::abcd").await, StatusCode::TOO_MANY_REQUESTS);
}

async fn fetch_as(app: &TestApp, client: &str) -> StatusCode {
    app.send_request(Method::GET, "/api/secret/abc123", &[("x-forwarded-for", client)], None)
        .await
        .status()
}

#[tokio::test]
async fn health_reports_backend() {
    let app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"status": "ok", "storage": "memory"}));
}

#[tokio::test]
async fn storage_failures_are_opaque() {
    let app = TestApp::with_store(Arc::new(UnavailableStore), test_config());

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"status": "unavailable", "storage": "unavailable"}));

    let response = app.get("/api/secret/abc123").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = read_text(response).await;
    assert!(!text.contains("pool"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["error"], "internal server error");

    let response = app.as_admin(Method::GET, "/api/admin/secrets").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn cors_preflight_allows_identity_header() {
    let app = TestApp::new();

    let response = app
        .send_request(
            Method::OPTIONS,
            "/api/admin/secrets",
            &[
                ("origin", "https://miniapp.example"),
                ("access-control-request-method", "GET"),
                ("access-control-request-headers", "x-telegram-user-id"),
            ],
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.contains("x-telegram-user-id"));
}
