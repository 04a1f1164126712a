//! Common test utilities for all integration tests.
//!
//! Builds the full router over an in-memory store and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

#[cfg(feature = "postgres_tests")]
pub mod test_db;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response},
    Router,
};
use chrono::{TimeZone, Utc};
use secretdrop::{
    api::build_router,
    config::AppConfig,
    domain::{SecretKey, SecretPayload, SecretRecord, TelegramIdentity},
    services::SecretService,
    storage::{InMemorySecretStore, SecretStore},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_ID: i64 = 123456789;
pub const INGEST_TOKEN: &str = "test-ingest-token-0123456789";

/// Configuration used by most tests: admin and ingestion enabled, no rate limit
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin.telegram_id = Some(ADMIN_ID);
    config.admin.ingest_token = Some(INGEST_TOKEN.to_string());
    config.api.fetch_rate_limit_per_minute = 0;
    config
}

pub struct TestApp {
    pub store: Arc<dyn SecretStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::with_store(Arc::new(InMemorySecretStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn SecretStore>, config: AppConfig) -> Self {
        let service = Arc::new(SecretService::new(store.clone(), config.admin.max_secret_bytes));
        let router = build_router(service, &config);
        Self { store, router }
    }

    /// The router is cloned per request; middleware state such as the rate
    /// limiter is shared between clones.
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = if let Some(json) = body {
            let bytes = serde_json::to_vec(&json).expect("serialize body");
            builder
                .header("content-type", "application/json")
                .body(Body::from(bytes))
                .expect("build request")
        } else {
            builder.body(Body::empty()).expect("build request")
        };

        self.router.clone().oneshot(request).await.expect("request")
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.send_request(Method::GET, path, &[], None).await
    }

    /// Request carrying the configured admin's identity header
    pub async fn as_admin(&self, method: Method, path: &str) -> Response<Body> {
        let admin = ADMIN_ID.to_string();
        self.send_request(method, path, &[("x-telegram-user-id", admin.as_str())], None).await
    }

    pub async fn as_user(&self, method: Method, path: &str, telegram_id: &str) -> Response<Body> {
        self.send_request(method, path, &[("x-telegram-user-id", telegram_id)], None).await
    }

    pub async fn ingest(&self, body: Value) -> Response<Body> {
        self.send_request(Method::POST, "/api/secrets", &[("x-ingest-token", INGEST_TOKEN)], Some(body))
            .await
    }

    /// Insert a record directly into the store
    pub async fn seed(&self, key: &str, payload: SecretPayload, uploader: TelegramIdentity, millis: i64) {
        let record = SecretRecord {
            key: SecretKey::from_string(key.to_string()),
            payload,
            uploader,
            created_at: Utc.timestamp_millis_opt(millis).unwrap(),
        };
        self.store.put(record).await.expect("seed record");
    }

    /// The example store: `abc123` holding the text "hello" from user 42
    pub async fn seed_example(&self) {
        self.seed(
            "abc123",
            SecretPayload::Text { content: "hello".to_string() },
            TelegramIdentity::User(42),
            1_700_000_000_000,
        )
        .await;
    }
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
