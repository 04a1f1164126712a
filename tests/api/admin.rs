use axum::http::{Method, StatusCode};
use secretdrop::domain::{SecretPayload, TelegramIdentity};
use serde_json::{json, Value};

use crate::common::{read_json, read_text, test_config, TestApp, ADMIN_ID};

#[tokio::test]
async fn admin_listing_has_summaries_only() {
    let app = TestApp::new();
    app.seed_example().await;
    app.seed(
        "doc1",
        SecretPayload::File { file_id: "BQACAgI".to_string() },
        TelegramIdentity::User(5),
        1_700_000_100_000,
    )
    .await;
    app.get("/api/secret/doc1?viewerId=9").await;

    let response = app.as_admin(Method::GET, "/api/admin/secrets").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(
        body,
        json!({
            "abc123": {"type": "text", "timestamp": 1_700_000_000_000i64, "viewCount": 0},
            "doc1": {"type": "file", "timestamp": 1_700_000_100_000i64, "viewCount": 1}
        })
    );
}

#[tokio::test]
async fn empty_store_lists_as_empty_object() {
    let app = TestApp::new();
    let body: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn non_admin_gets_no_data() {
    let app = TestApp::new();
    app.seed_example().await;

    let response = app.as_user(Method::GET, "/api/admin/secrets", "42").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let text = read_text(response).await;
    assert!(!text.contains("abc123"));
    assert!(!text.contains("hello"));

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn missing_or_malformed_identity_is_rejected() {
    let app = TestApp::new();

    let response = app.get("/api/admin/secrets").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "missing x-telegram-user-id header");

    for value in ["", "admin", "12.5", "123456789abc"] {
        let response = app.as_user(Method::GET, "/api/admin/secrets", value).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {value:?}");
    }
}

#[tokio::test]
async fn unconfigured_admin_denies_everyone() {
    let mut config = test_config();
    config.admin.telegram_id = None;
    let app = TestApp::with_config(config);
    app.seed_example().await;

    let response = app.as_user(Method::GET, "/api/admin/secrets", &ADMIN_ID.to_string()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.as_user(Method::DELETE, "/api/admin/secrets/abc123", &ADMIN_ID.to_string()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/secret/abc123").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_removes_secret_and_is_idempotent() {
    let app = TestApp::new();
    app.seed_example().await;
    app.get("/api/secret/abc123?viewerId=3").await;

    let response = app.as_admin(Method::DELETE, "/api/admin/secrets/abc123").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.get("/api/secret/abc123").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.as_admin(Method::GET, "/api/admin/secrets/abc123/views").await.status(),
        StatusCode::NOT_FOUND
    );

    let response = app.as_admin(Method::DELETE, "/api/admin/secrets/abc123").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.as_admin(Method::DELETE, "/api/admin/secrets/never-existed").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn non_admin_delete_leaves_secret_in_place() {
    let app = TestApp::new();
    app.seed_example().await;

    let response = app.as_user(Method::DELETE, "/api/admin/secrets/abc123", "42").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.get("/api/secret/abc123").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn views_require_admin() {
    let app = TestApp::new();
    app.seed_example().await;

    let response = app.as_user(Method::GET, "/api/admin/secrets/abc123/views", "42").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.as_admin(Method::GET, "/api/admin/secrets/abc123/views").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"key": "abc123", "views": []}));
}
