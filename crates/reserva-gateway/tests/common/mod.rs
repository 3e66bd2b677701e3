//! Shared fixtures for gateway integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use reserva_core::{BackendError, RetryPolicy, RetryingBackendClient};
use reserva_gateway::backend::BackendDispatcher;
use reserva_gateway::config::{CacheSettings, RateLimitSettings, StoreFailurePolicy};
use reserva_gateway::routes::policy_registry;
use reserva_gateway::server::build_app;
use reserva_gateway::state::AppState;
use reserva_store::{
    CounterHit, DynSharedStore, MemorySharedStore, ScanPage, SharedStore, StoreError,
};

/// Backend stub that counts invocations and echoes the dispatch arguments.
pub struct CountingDispatcher {
    calls: AtomicUsize,
}

impl CountingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendDispatcher for CountingDispatcher {
    async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
    ) -> Result<Value, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({
            "service": service,
            "operation": operation,
            "call": call,
            "echo": payload,
        }))
    }
}

/// Store whose every operation fails with a connection error.
pub struct FailingStore;

#[async_trait]
impl SharedStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::connection("store offline"))
    }

    async fn set_with_ttl(
        &self,
        _key: &str,
        _value: &[u8],
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::connection("store offline"))
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, StoreError> {
        Err(StoreError::connection("store offline"))
    }

    async fn incr_with_ttl(&self, _key: &str) -> Result<CounterHit, StoreError> {
        Err(StoreError::connection("store offline"))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, StoreError> {
        Err(StoreError::connection("store offline"))
    }

    async fn scan_page(
        &self,
        _pattern: &str,
        _cursor: u64,
        _count: usize,
    ) -> Result<ScanPage, StoreError> {
        Err(StoreError::connection("store offline"))
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemorySharedStore>,
    pub dispatcher: Arc<CountingDispatcher>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default(), RateLimitSettings::default())
    }

    pub fn with_settings(cache: CacheSettings, rate_limit: RateLimitSettings) -> Self {
        let store = Arc::new(MemorySharedStore::new());
        let dispatcher = CountingDispatcher::new();
        let app = build_router(store.clone(), dispatcher.clone(), cache, rate_limit);
        Self { app, store, dispatcher }
    }

    /// GET with an optional caller identity header.
    pub async fn get(&self, uri: &str, caller: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = caller {
            builder = builder.header("x-user-id", id);
        }
        self.app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, caller: Option<&str>, body: Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(id) = caller {
            builder = builder.header("x-user-id", id);
        }
        self.app
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }
}

pub fn build_router(
    store: DynSharedStore,
    dispatcher: Arc<CountingDispatcher>,
    cache: CacheSettings,
    rate_limit: RateLimitSettings,
) -> Router {
    let state = AppState::new(
        store,
        policy_registry(),
        dispatcher,
        cache,
        rate_limit,
        RetryingBackendClient::new(RetryPolicy::new(0, 1)),
    );
    build_app(state, 1024 * 1024)
}

/// Rate-limit settings with a small global quota for fast tests.
pub fn tight_rate_limit(max_requests: i64) -> RateLimitSettings {
    RateLimitSettings {
        window_secs: 60,
        max_requests,
        on_store_failure: StoreFailurePolicy::Closed,
    }
}

/// One GET against a standalone router, no caller identity.
pub async fn oneshot_get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(res: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub fn header_i64(res: &Response<Body>, name: &str) -> i64 {
    res.headers()[name].to_str().unwrap().parse().unwrap()
}

/// Gives spawned fire-and-forget tasks a moment to land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn assert_status(res: &Response<Body>, expected: StatusCode) {
    assert_eq!(res.status(), expected);
}
