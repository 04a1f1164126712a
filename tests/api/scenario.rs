//! The Mini App flow end to end: a user opens a key, the admin reviews the
//! store, confirms a delete and reloads the list.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{read_json, TestApp};

#[tokio::test]
async fn fetch_list_delete_refetch() {
    let app = TestApp::new();
    app.seed_example().await;

    let response = app.get("/api/secret/abc123?viewerId=555").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"type": "text", "uploaderId": 42, "content": "hello"}));

    let response = app.get("/api/secret/zzz999?viewerId=555").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert!(body["error"].is_string());

    let listing: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    let entry = &listing["abc123"];
    assert_eq!(entry["type"], "text");
    assert_eq!(entry["timestamp"], 1_700_000_000_000i64);
    assert!(entry.get("content").is_none());
    assert!(entry.get("fileId").is_none());
    assert_eq!(listing.as_object().unwrap().len(), 1);

    let response = app.as_admin(Method::DELETE, "/api/admin/secrets/abc123").await;
    assert!(response.status().is_success());

    // The client reloads the full list after every delete
    let listing: Value = read_json(app.as_admin(Method::GET, "/api/admin/secrets").await).await;
    assert_eq!(listing, json!({}));

    assert_eq!(app.get("/api/secret/abc123").await.status(), StatusCode::NOT_FOUND);
}
