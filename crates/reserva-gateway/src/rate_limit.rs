//! Distributed fixed-window rate limiting.
//!
//! One counter per `rate_limit:{clientAddress}:{scope}:{action}` key, shared
//! by every gateway instance through the store's atomic increment. The
//! window is fixed: the counter resets only when its key's TTL fully
//! elapses, and the boundary is set by whichever request first created the
//! key. The limit check is the one synchronous store operation on the
//! request path; it must complete (or fail according to the configured
//! policy) before the request proceeds.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use reserva_store::{DynSharedStore, StoreError};

use crate::config::StoreFailurePolicy;
use crate::error::ApiError;
use crate::middleware::client_address;
use crate::state::AppState;

/// Outcome of one counted request against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests seen in the current window, including this one.
    pub total_hits: i64,
    /// Quota left after this request; negative once over the limit.
    pub remaining_hits: i64,
    /// Seconds until the window resets.
    pub resets_in_secs: i64,
}

/// Fixed-window counter over the shared store.
#[derive(Clone)]
pub struct RateLimiter {
    store: DynSharedStore,
}

impl RateLimiter {
    /// Creates a limiter over the given store.
    #[must_use]
    pub fn new(store: DynSharedStore) -> Self {
        Self { store }
    }

    /// Counts one request against `key`.
    ///
    /// The increment and the TTL read happen in the same store round-trip;
    /// a missing TTL means this increment just created the window, so its
    /// expiry is set here. Never read-modify-write: the store's atomic
    /// increment is the only coordination primitive.
    pub async fn increment(
        &self,
        key: &str,
        window: Duration,
        limit: i64,
    ) -> Result<RateLimitInfo, StoreError> {
        let hit = self.store.incr_with_ttl(key).await?;

        if hit.ttl_secs < 0 {
            // First request of a fresh window; the key has no expiry yet.
            self.store.expire(key, window).await?;
        }

        let resets_in_secs = if hit.ttl_secs >= 0 {
            hit.ttl_secs
        } else {
            window.as_secs() as i64
        };

        Ok(RateLimitInfo {
            total_hits: hit.value,
            remaining_hits: limit - hit.value,
            resets_in_secs,
        })
    }
}

/// Endpoints exempt from rate limiting.
fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/healthz" | "/readyz" | "/metrics")
}

/// Rate-limit enforcement middleware.
///
/// Resolves the effective quota (route override, else global default),
/// counts the request, rejects over-quota callers with 429 and annotates
/// every response with `X-RateLimit-*` headers. A store failure is absorbed
/// by the configured [`StoreFailurePolicy`] and never surfaces as an
/// infrastructure error.
pub async fn enforce_quota(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if is_public_path(req.uri().path()) {
        return next.run(req).await;
    }

    let template = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let policy = state.registry.resolve(req.method(), &template);
    let (scope, action) = policy
        .map(|p| (p.scope.clone(), p.action.clone()))
        .unwrap_or_else(|| ("gateway".to_string(), "request".to_string()));
    let (limit, window) = policy
        .and_then(|p| p.quota)
        .map(|q| (q.limit, q.window))
        .unwrap_or((state.rate_limit.max_requests, state.rate_limit.window()));

    let address = client_address(&req);
    let key = format!("rate_limit:{address}:{scope}:{action}");

    let (info, reject) = match state.limiter.increment(&key, window, limit).await {
        Ok(info) => (info, info.remaining_hits < 0),
        Err(e) => {
            tracing::warn!(
                key = %key,
                error = %e,
                policy = ?state.rate_limit.on_store_failure,
                "rate-limit store failure"
            );
            match state.rate_limit.on_store_failure {
                // Report the window as fully consumed and reject.
                StoreFailurePolicy::Closed => (
                    RateLimitInfo {
                        total_hits: limit,
                        remaining_hits: 0,
                        resets_in_secs: window.as_secs() as i64,
                    },
                    true,
                ),
                StoreFailurePolicy::Open => (
                    RateLimitInfo {
                        total_hits: 0,
                        remaining_hits: limit,
                        resets_in_secs: window.as_secs() as i64,
                    },
                    false,
                ),
            }
        }
    };

    let mut res = if reject {
        tracing::debug!(
            key = %key,
            total_hits = info.total_hits,
            limit,
            "request over quota"
        );
        crate::metrics::record_rate_limit_rejected(&scope, &action);
        ApiError::QuotaExceeded.into_response()
    } else {
        crate::metrics::record_rate_limit_allowed();
        next.run(req).await
    };

    apply_quota_headers(&mut res, limit, &info);
    res
}

fn apply_quota_headers(res: &mut Response, limit: i64, info: &RateLimitInfo) {
    let headers = res.headers_mut();
    headers.insert("x-ratelimit-limit", int_header(limit));
    headers.insert("x-ratelimit-remaining", int_header(info.remaining_hits));
    headers.insert("x-ratelimit-reset", int_header(info.resets_in_secs));
}

fn int_header(value: i64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use reserva_store::{MemorySharedStore, SharedStore};

    #[tokio::test]
    async fn test_increment_sequence_against_limit() {
        let store = Arc::new(MemorySharedStore::new());
        let limiter = RateLimiter::new(store);
        let window = Duration::from_secs(60);

        let mut remaining = Vec::new();
        for _ in 0..4 {
            let info = limiter
                .increment("rate_limit:1.2.3.4:inventory:list", window, 3)
                .await
                .unwrap();
            remaining.push(info.remaining_hits);
        }
        assert_eq!(remaining, vec![2, 1, 0, -1]);
    }

    #[tokio::test]
    async fn test_first_hit_sets_window_expiry() {
        let store = Arc::new(MemorySharedStore::new());
        let limiter = RateLimiter::new(store.clone());

        let info = limiter
            .increment("rate_limit:k", Duration::from_secs(60), 10)
            .await
            .unwrap();
        assert_eq!(info.total_hits, 1);
        assert_eq!(info.resets_in_secs, 60);

        // The second hit reads the TTL established by the first.
        let hit = store.incr_with_ttl("rate_limit:k").await.unwrap();
        assert!(hit.ttl_secs > 0 && hit.ttl_secs <= 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reset_restarts_counter() {
        let store = Arc::new(MemorySharedStore::new());
        let limiter = RateLimiter::new(store);
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.increment("rate_limit:k", window, 3).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(61)).await;

        let info = limiter.increment("rate_limit:k", window, 3).await.unwrap();
        assert_eq!(info.total_hits, 1, "expired window restarts at 1");
        assert_eq!(info.remaining_hits, 2);
        assert_eq!(info.resets_in_secs, 60, "fresh window carries a fresh TTL");
    }

    #[test]
    fn test_public_paths_are_exempt() {
        assert!(is_public_path("/healthz"));
        assert!(is_public_path("/metrics"));
        assert!(!is_public_path("/api/bookings"));
    }
}
