//! In-memory shared store.
//!
//! Test double and single-instance fallback with the same observable
//! semantics as the Redis backend: integer-string counters, TTL sentinels
//! (`-1` for "no expiry"), glob scans. Deadlines use `tokio::time::Instant`
//! so paused-clock tests can drive expiry deterministically.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::traits::{CounterHit, ScanPage, SharedStore};

#[derive(Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn ttl_secs(&self, now: Instant) -> i64 {
        match self.expires_at {
            None => -1,
            // Round up, matching redis TTL granularity for a freshly-set key.
            Some(at) => (at - now).as_secs_f64().ceil() as i64,
        }
    }
}

/// In-process [`SharedStore`] implementation.
#[derive(Default)]
pub struct MemorySharedStore {
    entries: DashMap<String, Entry>,
}

impl MemorySharedStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys; test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    /// Returns `true` when no live keys remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SharedStore for MemorySharedStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            if let Some((_, entry)) = self.entries.remove(key)
                && !entry.is_expired(now)
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn incr_with_ttl(&self, key: &str) -> Result<CounterHit, StoreError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: b"0".to_vec(),
            expires_at: None,
        });
        if entry.is_expired(now) {
            // The window fully elapsed; the counter restarts from scratch.
            *entry = Entry {
                value: b"0".to_vec(),
                expires_at: None,
            };
        }

        let current: i64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| StoreError::corrupt_value(key, "counter is not an integer"))?;
        let value = current + 1;
        entry.value = value.to_string().into_bytes();

        Ok(CounterHit {
            value,
            ttl_secs: entry.ttl_secs(now),
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        let now = Instant::now();
        let mut matching: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_expired(now) && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();
        // Stable order so cursor pagination is reproducible.
        matching.sort();

        let start = cursor as usize;
        if start >= matching.len() {
            return Ok(ScanPage {
                cursor: 0,
                keys: Vec::new(),
            });
        }
        let end = (start + count.max(1)).min(matching.len());
        let next = if end == matching.len() { 0 } else { end as u64 };
        Ok(ScanPage {
            cursor: next,
            keys: matching[start..end].to_vec(),
        })
    }
}

/// Matches `text` against a redis-style glob `pattern` with `*` wildcards.
///
/// Only `*` is supported; that is the full vocabulary of the gateway's
/// invalidation patterns.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat = pattern.as_bytes();
    let txt = text.as_bytes();
    let (mut p, mut t) = (0usize, 0usize);
    let (mut star, mut mark) = (usize::MAX, 0usize);

    while t < txt.len() {
        if p < pat.len() && (pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == b'*' {
            star = p;
            mark = t;
            p += 1;
        } else if star != usize::MAX {
            p = star + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}
