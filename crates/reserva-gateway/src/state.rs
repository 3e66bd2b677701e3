//! Shared application state.

use std::sync::Arc;

use reserva_core::RetryingBackendClient;
use reserva_store::DynSharedStore;

use crate::backend::BackendDispatcher;
use crate::cache::CacheInvalidator;
use crate::config::{CacheSettings, RateLimitSettings};
use crate::policy::PolicyRegistry;
use crate::rate_limit::RateLimiter;

/// Everything the request path needs, cloned into each handler and layer.
#[derive(Clone)]
pub struct AppState {
    pub store: DynSharedStore,
    pub registry: Arc<PolicyRegistry>,
    pub invalidator: Arc<CacheInvalidator>,
    pub limiter: RateLimiter,
    pub retry: RetryingBackendClient,
    pub dispatcher: Arc<dyn BackendDispatcher>,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
}

impl AppState {
    pub fn new(
        store: DynSharedStore,
        registry: PolicyRegistry,
        dispatcher: Arc<dyn BackendDispatcher>,
        cache: CacheSettings,
        rate_limit: RateLimitSettings,
        retry: RetryingBackendClient,
    ) -> Self {
        let invalidator = Arc::new(CacheInvalidator::new(store.clone(), cache.scan_page_size));
        let limiter = RateLimiter::new(store.clone());
        Self {
            store,
            registry: Arc::new(registry),
            invalidator,
            limiter,
            retry,
            dispatcher,
            cache,
            rate_limit,
        }
    }
}
