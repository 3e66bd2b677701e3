//! Cache key construction and query-string normalization.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Prefix shared by every cached response key.
pub const CACHE_PREFIX: &str = "cache";

/// Caller segment used when no authenticated subject is attached.
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Builds the full store key for a cached response.
///
/// The query digest makes the key stable under parameter reordering, so
/// `?a=1&b=2` and `?b=2&a=1` address the same entry.
pub fn cache_key(group: &str, path: &str, caller: &str, raw_query: Option<&str>) -> String {
    format!("{CACHE_PREFIX}:{group}:{path}:{caller}:{}", query_digest(raw_query))
}

/// Normalizes a raw query string into a base64-encoded JSON object with
/// keys in sorted order. Repeated parameters collapse to the last value.
pub fn query_digest(raw_query: Option<&str>) -> String {
    let params: BTreeMap<String, String> = raw_query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    let json = serde_json::to_string(&params).unwrap_or_else(|_| String::from("{}"));
    STANDARD.encode(json)
}
