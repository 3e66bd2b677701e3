use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use uuid::Uuid;

/// Caller identity handed off by the fronting auth layer.
///
/// The gateway itself performs no token validation; the auth service in
/// front of it resolves the subject and forwards it. Requests without a
/// resolved subject are treated as anonymous by the cache layer.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Authenticated subject id, if any.
    pub subject: Option<String>,
}

// Middleware that ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or(HeaderValue::from_static("unknown"))
        });

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;

    // Add/propagate the request id header to response
    res.headers_mut().insert(header_name, req_id_value);

    res
}

/// Populates the [`Caller`] extension from the auth layer's hand-off header.
pub async fn caller_context(mut req: Request<Body>, next: Next) -> Response {
    let subject = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    req.extensions_mut().insert(Caller { subject });
    next.run(req).await
}

/// Resolves the client's network address for rate-limit keying.
///
/// Prefers the first entry of `X-Forwarded-For` (the gateway sits behind a
/// load balancer) and falls back to the socket peer address.
pub fn client_address(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_header(name: &'static str, value: &str) -> Request<Body> {
        Request::builder()
            .uri("/api/inventory/items")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        let req = request_with_header("x-forwarded-for", "203.0.113.9, 10.0.0.1");
        assert_eq!(client_address(&req), "203.0.113.9");
    }

    #[test]
    fn test_client_address_falls_back_to_peer() {
        let mut req = Request::builder()
            .uri("/api/inventory/items")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("198.51.100.4:55110".parse().unwrap()));
        assert_eq!(client_address(&req), "198.51.100.4");
    }

    #[test]
    fn test_client_address_unknown_without_any_source() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_address(&req), "unknown");
    }
}
