use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{read_json, test_config, TestApp};

#[tokio::test]
async fn ingested_text_secret_is_readable_by_key() {
    let app = TestApp::new();

    let response = app.ingest(json!({"type": "text", "content": "launch code", "uploaderId": 42})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: Value = read_json(response).await;
    assert_eq!(created["type"], "text");
    assert!(created["timestamp"].is_i64());

    let key = created["key"].as_str().expect("generated key");
    assert_eq!(key.len(), 24);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));

    let fetched: Value = read_json(app.get(&format!("/api/secret/{key}?viewerId=8")).await).await;
    assert_eq!(fetched, json!({"type": "text", "uploaderId": 42, "content": "launch code"}));

    let listing: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    assert_eq!(listing[key]["timestamp"], created["timestamp"]);
    assert_eq!(listing[key]["viewCount"], 1);
}

#[tokio::test]
async fn ingested_file_secret_defaults_to_unknown_uploader() {
    let app = TestApp::new();

    let response = app.ingest(json!({"type": "file", "fileId": "BQACAgIAAxkBAAIB"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = read_json(response).await;
    let key = created["key"].as_str().unwrap();

    let fetched: Value = read_json(app.get(&format!("/api/secret/{key}")).await).await;
    assert_eq!(fetched, json!({"type": "file", "uploaderId": "unknown", "fileId": "BQACAgIAAxkBAAIB"}));
}

#[tokio::test]
async fn generated_keys_are_distinct() {
    let app = TestApp::new();
    let mut keys = std::collections::HashSet::new();

    for i in 0..20 {
        let created: Value =
            read_json(app.ingest(json!({"type": "text", "content": format!("secret {i}")})).await)
                .await;
        keys.insert(created["key"].as_str().unwrap().to_string());
    }
    assert_eq!(keys.len(), 20);
}

#[tokio::test]
async fn ingest_requires_token() {
    let app = TestApp::new();
    let body = json!({"type": "text", "content": "x"});

    let response = app.send_request(Method::POST, "/api/secrets", &[], Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send_request(Method::POST, "/api/secrets", &[("x-ingest-token", "wrong")], Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let listing: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    assert_eq!(listing, json!({}));
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let mut config = test_config();
    config.admin.max_secret_bytes = 16;
    let app = TestApp::with_config(config);

    let cases = [
        json!({"type": "text", "content": ""}),
        json!({"type": "text", "content": "   "}),
        json!({"type": "text", "content": "x".repeat(17)}),
        json!({"type": "file", "fileId": ""}),
        json!({"type": "file", "fileId": "f".repeat(257)}),
        json!({"type": "image", "content": "x"}),
        json!({"type": "text"}),
        json!({"content": "no type"}),
    ];

    for body in cases {
        let response = app.ingest(body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        let error: Value = read_json(response).await;
        assert_eq!(error["code"], "bad_request");
        assert!(error["error"].is_string());
    }
}

#[tokio::test]
async fn ingestion_is_not_mounted_without_token() {
    let mut config = test_config();
    config.admin.ingest_token = None;
    let app = TestApp::with_config(config);

    let response = app
        .send_request(
            Method::POST,
            "/api/secrets",
            &[("x-ingest-token", "anything")],
            Some(json!({"type": "text", "content": "x"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
