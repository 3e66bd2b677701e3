//! Route-registration-time policy configuration.
//!
//! Each API route is registered together with a [`RoutePolicy`] describing
//! how the resilience layer treats it: cache group/TTL/skip and an optional
//! rate-limit quota override. The cache and rate-limit middleware resolve
//! policies by direct lookup on the matched path template; there is no
//! runtime metadata scanning.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::Method;

/// Cache group applied when a route does not name one.
pub const DEFAULT_CACHE_GROUP: &str = "default";

/// Per-route cache behavior.
#[derive(Debug, Clone, Default)]
pub struct CachePolicy {
    /// Never cache this route, regardless of method or headers.
    pub skip: bool,
    /// TTL override; `None` falls back to the configured default.
    pub ttl: Option<Duration>,
    /// Cache group for scoped invalidation; `None` means "default".
    pub group: Option<String>,
}

impl CachePolicy {
    /// The group this route's entries are filed under.
    #[must_use]
    pub fn group(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_CACHE_GROUP)
    }
}

/// Per-route rate-limit quota override.
#[derive(Debug, Clone, Copy)]
pub struct QuotaOverride {
    /// Request ceiling per window.
    pub limit: i64,
    /// Fixed window length.
    pub window: Duration,
}

/// Resilience policy attached to one (method, path template) pair.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    /// Limiter identity: coarse service scope (e.g. "inventory").
    pub scope: String,
    /// Limiter identity: operation within the scope (e.g. "list").
    pub action: String,
    /// Cache behavior.
    pub cache: CachePolicy,
    /// Quota override; `None` falls back to the global default.
    pub quota: Option<QuotaOverride>,
}

impl RoutePolicy {
    /// Creates a policy with default cache behavior and no quota override.
    #[must_use]
    pub fn new(scope: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            action: action.into(),
            cache: CachePolicy::default(),
            quota: None,
        }
    }

    /// Files cache entries under `group`.
    #[must_use]
    pub fn cache_group(mut self, group: impl Into<String>) -> Self {
        self.cache.group = Some(group.into());
        self
    }

    /// Overrides the cache TTL for this route.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = Some(ttl);
        self
    }

    /// Excludes this route from caching entirely.
    #[must_use]
    pub fn skip_cache(mut self) -> Self {
        self.cache.skip = true;
        self
    }

    /// Overrides the rate-limit quota for this route.
    #[must_use]
    pub fn quota(mut self, limit: i64, window: Duration) -> Self {
        self.quota = Some(QuotaOverride { limit, window });
        self
    }
}

/// Lookup table from (method, matched path template) to [`RoutePolicy`].
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    routes: HashMap<(Method, String), RoutePolicy>,
}

impl PolicyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a policy for a route. Later registrations win.
    pub fn register(&mut self, method: Method, template: impl Into<String>, policy: RoutePolicy) {
        self.routes.insert((method, template.into()), policy);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn route(mut self, method: Method, template: impl Into<String>, policy: RoutePolicy) -> Self {
        self.register(method, template, policy);
        self
    }

    /// Resolves the policy for a request, if the route registered one.
    #[must_use]
    pub fn resolve(&self, method: &Method, template: &str) -> Option<&RoutePolicy> {
        self.routes.get(&(method.clone(), template.to_string()))
    }
}
