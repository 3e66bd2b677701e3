//! Route table and per-route resilience policies.
//!
//! Routes and policies are declared side by side so the path template used
//! for axum routing is the same string the policy registry keys on.

use std::time::Duration;

use axum::{Router, http::Method, routing::get};

use crate::handlers;
use crate::policy::{PolicyRegistry, RoutePolicy};
use crate::state::AppState;

/// Policies for every API route the gateway fronts.
pub fn policy_registry() -> PolicyRegistry {
    PolicyRegistry::new()
        .route(
            Method::GET,
            "/api/inventory/items",
            RoutePolicy::new("inventory", "list")
                .cache_group("inventory")
                .cache_ttl(Duration::from_secs(300)),
        )
        .route(
            Method::GET,
            "/api/inventory/items/{id}",
            RoutePolicy::new("inventory", "get")
                .cache_group("inventory")
                .cache_ttl(Duration::from_secs(300)),
        )
        .route(
            Method::GET,
            "/api/bookings",
            RoutePolicy::new("bookings", "list")
                .cache_group("bookings")
                .cache_ttl(Duration::from_secs(60)),
        )
        .route(
            Method::POST,
            "/api/bookings",
            RoutePolicy::new("bookings", "create").skip_cache(),
        )
        .route(
            Method::GET,
            "/api/users/me",
            RoutePolicy::new("users", "me").cache_group("users"),
        )
        .route(
            Method::GET,
            "/api/reports/occupancy",
            RoutePolicy::new("reporting", "occupancy")
                .cache_group("reporting")
                .quota(10, Duration::from_secs(60)),
        )
}

/// The bare route table, without the middleware stack.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/inventory/items", get(handlers::list_inventory_items))
        .route("/api/inventory/items/{id}", get(handlers::get_inventory_item))
        .route(
            "/api/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/api/users/me", get(handlers::get_current_user))
        .route("/api/reports/occupancy", get(handlers::occupancy_report))
}
