//! Invalidation triggered by write operations, end to end.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, settle};

#[tokio::test]
async fn test_booking_create_invalidates_bookings_and_inventory() {
    let app = TestApp::new();

    // Warm three groups.
    app.get("/api/bookings", Some("u-1")).await;
    app.get("/api/inventory/items", Some("u-1")).await;
    app.get("/api/reports/occupancy", Some("u-1")).await;
    settle().await;
    assert_eq!(app.dispatcher.calls(), 3);

    let created = app
        .post_json("/api/bookings", Some("u-1"), json!({"roomId": "12"}))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    settle().await;

    // Bookings and inventory were purged and must be regenerated.
    let bookings = app.get("/api/bookings", Some("u-1")).await;
    assert!(bookings.headers().get("x-cache").is_none());
    let inventory = app.get("/api/inventory/items", Some("u-1")).await;
    assert!(inventory.headers().get("x-cache").is_none());

    // The reporting group was untouched.
    let report = app.get("/api/reports/occupancy", Some("u-1")).await;
    assert_eq!(report.headers()["x-cache"], "hit");

    // 3 warmups + 1 create + 2 regenerated reads.
    assert_eq!(app.dispatcher.calls(), 6);
}

#[tokio::test]
async fn test_invalidation_clears_other_callers_in_group() {
    let app = TestApp::new();

    app.get("/api/bookings", Some("u-1")).await;
    app.get("/api/bookings", Some("u-2")).await;
    settle().await;

    app.post_json("/api/bookings", Some("u-1"), json!({"roomId": "7"}))
        .await;
    settle().await;

    // Group invalidation is not caller-scoped; both entries are gone.
    let other = app.get("/api/bookings", Some("u-2")).await;
    assert!(other.headers().get("x-cache").is_none());
}
