//! HTTP handlers.
//!
//! API handlers are thin proxies: extract the request shape, dispatch the
//! corresponding backend RPC through the retrying client, return the JSON
//! the backend produced. All caching and rate limiting happens in the
//! middleware stack around them.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use reserva_core::{BackendError, ErrorCode};

use crate::error::ApiError;
use crate::middleware::Caller;
use crate::state::AppState;

/// Dispatches one backend operation through the retry layer.
async fn proxy(
    state: &AppState,
    service: &'static str,
    operation: &'static str,
    payload: Value,
) -> Result<Json<Value>, ApiError> {
    let dispatcher = state.dispatcher.clone();
    let context = format!("{service}.{operation}");
    let result = state
        .retry
        .call(
            || {
                let dispatcher = dispatcher.clone();
                let payload = payload.clone();
                async move { dispatcher.dispatch(service, operation, payload).await }
            },
            &context,
        )
        .await;

    match result {
        Ok(value) => {
            crate::metrics::record_backend_call(service, "ok");
            Ok(Json(value))
        }
        Err(err) => {
            crate::metrics::record_backend_call(service, "error");
            Err(ApiError::Backend(err))
        }
    }
}

fn require_caller(caller: &Caller) -> Result<&str, ApiError> {
    caller.subject.as_deref().ok_or_else(|| {
        ApiError::Backend(BackendError::new(
            ErrorCode::Unauthenticated,
            "missing caller identity",
        ))
    })
}

pub async fn list_inventory_items(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, "inventory", "items.list", json!({ "query": params })).await
}

pub async fn get_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, "inventory", "items.get", json!({ "id": id })).await
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let subject = require_caller(&caller)?;
    proxy(
        &state,
        "bookings",
        "bookings.list",
        json!({ "callerId": subject, "query": params }),
    )
    .await
}

/// Creates a booking, then drops the cache groups it made stale.
///
/// The purge runs after the backend confirms the write and before the
/// response is sent, so a caller re-reading immediately sees fresh data.
/// Purge failures inside the invalidator are logged, not surfaced; stale
/// entries still expire by TTL.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subject = require_caller(&caller)?;
    let Json(created) = proxy(
        &state,
        "bookings",
        "bookings.create",
        json!({ "callerId": subject, "booking": body }),
    )
    .await?;

    let removed = state
        .invalidator
        .invalidate_groups(&["bookings", "inventory"])
        .await;
    tracing::debug!(removed, "post-booking cache invalidation");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Value>, ApiError> {
    let subject = require_caller(&caller)?;
    proxy(&state, "users", "users.get", json!({ "id": subject })).await
}

pub async fn occupancy_report(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, "reporting", "reports.occupancy", json!({ "query": params })).await
}

/// Liveness: the process is up.
pub async fn healthz() -> Json<Value> {
    json_status("ok")
}

/// Readiness: the shared store answers a read.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.get("readyz:probe").await {
        Ok(_) => (StatusCode::OK, json_status("ready")),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, json_status("store unreachable"))
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    match crate::metrics::render_metrics() {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

fn json_status(status: &str) -> Json<Value> {
    Json(json!({ "status": status }))
}
