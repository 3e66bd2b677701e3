//! Read-through caching middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderValue, Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::entry::CacheEntry;
use crate::cache::key::{ANONYMOUS_CALLER, cache_key};
use crate::middleware::Caller;
use crate::policy::CachePolicy;
use crate::state::AppState;

/// Read-through response cache middleware.
///
/// On a hit the stored payload is returned without invoking the inner
/// handler. On a miss the handler runs, successful responses are written
/// back without blocking the reply, and the body is forwarded unchanged.
/// Store failures on the read path degrade to a miss.
pub async fn response_cache(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.cache.enabled {
        return next.run(req).await;
    }

    let template = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let policy = state
        .registry
        .resolve(req.method(), &template)
        .map(|p| p.cache.clone())
        .unwrap_or_default();

    if should_bypass(&req, &policy) {
        return next.run(req).await;
    }

    let group = policy.group().to_string();
    let caller = req
        .extensions()
        .get::<Caller>()
        .and_then(|c| c.subject.clone())
        .unwrap_or_else(|| ANONYMOUS_CALLER.to_string());
    let key = cache_key(&group, req.uri().path(), &caller, req.uri().query());

    match state.store.get(&key).await {
        Ok(Some(bytes)) => match CacheEntry::decode(&bytes) {
            Ok(entry) => {
                crate::metrics::record_cache_hit(&group);
                tracing::debug!(key = %key, size_bytes = entry.size_bytes, "cache hit");
                return hit_response(entry);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "undecodable cache entry, treating as miss");
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "cache read failed, treating as miss");
        }
    }
    crate::metrics::record_cache_miss(&group);

    let started = Instant::now();
    let res = next.run(req).await;
    let generation_time = started.elapsed();

    if !res.status().is_success() {
        return res;
    }

    // Buffer the body so it can be both stored and forwarded.
    let (parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "failed to buffer response body");
            return crate::error::ApiError::internal("response buffering failed").into_response();
        }
    };

    let entry = CacheEntry::new(bytes.to_vec(), generation_time);
    match entry.encode() {
        Ok(encoded) => {
            let store = state.store.clone();
            let ttl = policy.ttl.unwrap_or_else(|| state.cache.default_ttl());
            let write_key = key.clone();
            // Fire-and-forget: the caller never waits on the write.
            tokio::spawn(async move {
                if let Err(e) = store.set_with_ttl(&write_key, &encoded, ttl).await {
                    tracing::warn!(key = %write_key, error = %e, "cache write failed");
                }
            });
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to encode cache entry");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// A request skips the cache when the route opts out, the method is not
/// GET, or the client sent `Cache-Control: no-cache` or `no-store`.
fn should_bypass(req: &Request<Body>, policy: &CachePolicy) -> bool {
    if policy.skip || req.method() != Method::GET {
        return true;
    }
    req.headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            let v = v.to_ascii_lowercase();
            v.contains("no-cache") || v.contains("no-store")
        })
}

fn hit_response(entry: CacheEntry) -> Response {
    let mut res = Response::new(Body::from(entry.payload));
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    res.headers_mut()
        .insert("x-cache", HeaderValue::from_static("hit"));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn get_request(cache_control: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri("/api/items");
        if let Some(v) = cache_control {
            builder = builder.header(header::CACHE_CONTROL, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bypass_on_non_get() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/items")
            .body(Body::empty())
            .unwrap();
        assert!(should_bypass(&req, &CachePolicy::default()));
    }

    #[test]
    fn test_bypass_on_no_store() {
        assert!(should_bypass(&get_request(Some("no-store")), &CachePolicy::default()));
        assert!(should_bypass(&get_request(Some("no-cache")), &CachePolicy::default()));
        assert!(should_bypass(
            &get_request(Some("max-age=0, no-cache")),
            &CachePolicy::default()
        ));
    }

    #[test]
    fn test_cacheable_get() {
        assert!(!should_bypass(&get_request(None), &CachePolicy::default()));
        assert!(!should_bypass(&get_request(Some("max-age=60")), &CachePolicy::default()));
    }

    #[test]
    fn test_route_opt_out() {
        let policy = CachePolicy { skip: true, ttl: None, group: None };
        assert!(should_bypass(&get_request(None), &policy));
    }

    #[test]
    fn test_hit_response_shape() {
        let entry = CacheEntry::new(b"[]".to_vec(), Duration::from_millis(5));
        let res = hit_response(entry);
        assert_eq!(res.headers()["x-cache"], "hit");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    }
}
