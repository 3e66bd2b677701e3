//! End-to-end behavior of the read-through response cache.

mod common;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use serde_json::json;
use tower::ServiceExt;

use common::{TestApp, body_bytes, body_json, settle};
use reserva_gateway::config::{CacheSettings, RateLimitSettings};

#[tokio::test]
async fn test_repeated_get_is_served_from_cache() {
    let app = TestApp::new();

    let first = app.get("/api/inventory/items", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_bytes(first).await;
    settle().await;

    let second = app.get("/api/inventory/items", None).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-cache"], "hit");
    let second_body = body_bytes(second).await;

    // Byte-for-byte identical payload, single backend invocation.
    assert_eq!(first_body, second_body);
    assert_eq!(app.dispatcher.calls(), 1);
}

#[tokio::test]
async fn test_query_order_addresses_the_same_entry() {
    let app = TestApp::new();

    app.get("/api/inventory/items?room=12&date=2026-09-01", None).await;
    settle().await;
    let res = app.get("/api/inventory/items?date=2026-09-01&room=12", None).await;

    assert_eq!(res.headers()["x-cache"], "hit");
    assert_eq!(app.dispatcher.calls(), 1);
}

#[tokio::test]
async fn test_different_query_values_miss() {
    let app = TestApp::new();

    app.get("/api/inventory/items?room=12", None).await;
    settle().await;
    app.get("/api/inventory/items?room=13", None).await;

    assert_eq!(app.dispatcher.calls(), 2);
}

#[tokio::test]
async fn test_callers_get_separate_entries() {
    let app = TestApp::new();

    let mine = app.get("/api/users/me", Some("u-1")).await;
    assert_eq!(mine.status(), StatusCode::OK);
    settle().await;

    let theirs = app.get("/api/users/me", Some("u-2")).await;
    assert_eq!(theirs.status(), StatusCode::OK);
    assert!(theirs.headers().get("x-cache").is_none());
    assert_eq!(app.dispatcher.calls(), 2);

    let mine_again = app.get("/api/users/me", Some("u-1")).await;
    assert_eq!(mine_again.headers()["x-cache"], "hit");
    assert_eq!(app.dispatcher.calls(), 2);
}

#[tokio::test]
async fn test_no_store_header_bypasses_cache() {
    let app = TestApp::new();

    app.get("/api/inventory/items", None).await;
    settle().await;

    let req = Request::builder()
        .uri("/api/inventory/items")
        .header("cache-control", "no-store")
        .body(Body::empty())
        .unwrap();
    let res = app.app.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-cache").is_none());
    assert_eq!(app.dispatcher.calls(), 2);
}

#[tokio::test]
async fn test_post_is_never_cached() {
    let app = TestApp::new();

    let first = app
        .post_json("/api/bookings", Some("u-1"), json!({"roomId": "12"}))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    settle().await;

    let second = app
        .post_json("/api/bookings", Some("u-1"), json!({"roomId": "12"}))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(app.dispatcher.calls(), 2);
}

#[tokio::test]
async fn test_kill_switch_disables_caching() {
    let cache = CacheSettings { enabled: false, ..CacheSettings::default() };
    let app = TestApp::with_settings(cache, RateLimitSettings::default());

    app.get("/api/inventory/items", None).await;
    settle().await;
    let res = app.get("/api/inventory/items", None).await;

    assert!(res.headers().get("x-cache").is_none());
    assert_eq!(app.dispatcher.calls(), 2);
}

#[tokio::test]
async fn test_backend_failure_is_not_cached() {
    // An unauthenticated request fails before reaching the backend; the
    // error response must not poison the cache for a later valid caller.
    let app = TestApp::new();

    let denied = app.get("/api/users/me", None).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    settle().await;

    let denied_again = app.get("/api/users/me", None).await;
    assert_eq!(denied_again.status(), StatusCode::UNAUTHORIZED);
    assert!(denied_again.headers().get("x-cache").is_none());

    let ok = app.get("/api/users/me", Some("u-1")).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(app.dispatcher.calls(), 1);
}

#[tokio::test]
async fn test_hit_preserves_json_payload() {
    let app = TestApp::new();

    app.get("/api/inventory/items/42", None).await;
    settle().await;
    let res = app.get("/api/inventory/items/42", None).await;
    assert_eq!(res.headers()["x-cache"], "hit");

    let json = body_json(res).await;
    assert_eq!(json["echo"]["id"], "42");
}
