//! The shared store contract consumed by the cache and rate-limit layers.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Result of one atomic counter hit.
///
/// `ttl_secs` is the key's remaining TTL as reported by the store in the
/// same round-trip as the increment: `-1` means the key exists without an
/// expiry (i.e. this increment just created it), `-2` means the key is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterHit {
    /// Counter value after the increment.
    pub value: i64,
    /// Remaining TTL in seconds, or a negative sentinel (redis semantics).
    pub ttl_secs: i64,
}

/// One page of a cursor-paginated key scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Cursor to pass to the next call; `0` means the scan is complete.
    pub cursor: u64,
    /// Keys matched in this page.
    pub keys: Vec<String>,
}

impl ScanPage {
    /// Returns `true` when the scan has visited the whole key space.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor == 0
    }
}

/// Network-accessible key-value store shared by all gateway instances.
///
/// Implementations must be thread-safe (`Send + Sync`) and must provide the
/// atomicity guarantees the gateway leans on: [`incr_with_ttl`] is the one
/// cross-instance coordination primitive and must never be emulated with a
/// read-then-write sequence.
///
/// [`incr_with_ttl`]: SharedStore::incr_with_ttl
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Reads a single key.
    ///
    /// Returns `None` for missing (or expired) keys.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for absent keys.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes a single key with a TTL after which the store discards it.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Deletes the given keys, returning how many existed.
    ///
    /// An empty slice is a no-op.
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Atomically increments the integer counter at `key` and reads its
    /// remaining TTL in the same round-trip.
    ///
    /// The key is created at `1` if absent. Created keys carry no expiry
    /// until the caller sets one via [`expire`](SharedStore::expire).
    async fn incr_with_ttl(&self, key: &str) -> Result<CounterHit, StoreError>;

    /// Sets an expiry on an existing key.
    ///
    /// Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Returns one page of keys matching a glob `pattern`, starting at
    /// `cursor` (`0` for the first page). `count` is a page-size hint.
    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<ScanPage, StoreError>;
}
