//! Scoped cache invalidation and the age-based sweep.

use std::time::Duration;

use futures_util::future::join_all;
use reserva_store::{DynSharedStore, StoreError};

use crate::cache::entry::{CacheEntry, epoch_ms_now};
use crate::cache::key::CACHE_PREFIX;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Cache keys examined.
    pub scanned: u64,
    /// Entries deleted (stale or undecodable).
    pub removed: u64,
}

/// Deletes cached responses by group, path, or caller.
///
/// All deletion goes through cursor-paginated key enumeration so a large
/// keyspace is never enumerated in one blocking store call.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: DynSharedStore,
    scan_page_size: usize,
}

impl CacheInvalidator {
    pub fn new(store: DynSharedStore, scan_page_size: usize) -> Self {
        Self { store, scan_page_size }
    }

    /// Enumerates every key matching `pattern`, page by page, to cursor
    /// completion. Keys are collected before any deletion so concurrent
    /// deletes cannot perturb the cursor walk.
    async fn matching_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut cursor = 0u64;
        loop {
            let page = self
                .store
                .scan_page(pattern, cursor, self.scan_page_size)
                .await?;
            let complete = page.is_complete();
            cursor = page.cursor;
            keys.extend(page.keys);
            if complete {
                break;
            }
        }
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<u64, StoreError> {
        let mut removed = 0;
        for chunk in keys.chunks(self.scan_page_size.max(1)) {
            removed += self.store.delete(chunk).await?;
        }
        Ok(removed)
    }

    /// Deletes every key matching `pattern`. Returns the number removed.
    pub async fn purge_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
        let keys = self.matching_keys(pattern).await?;
        let removed = self.delete_keys(&keys).await?;
        tracing::debug!(pattern = %pattern, removed, "cache purge");
        Ok(removed)
    }

    /// Invalidates entries for the given route paths, across every group.
    /// With a caller id only that caller's entries go; without one, every
    /// caller's. Failures on one path are logged and do not stop the rest.
    pub async fn invalidate_paths(&self, paths: &[&str], caller: Option<&str>) -> u64 {
        let mut removed = 0;
        for path in paths {
            let pattern = match caller {
                Some(id) => format!("{CACHE_PREFIX}:*:{path}:{id}:*"),
                None => format!("{CACHE_PREFIX}:*:{path}:*"),
            };
            match self.purge_pattern(&pattern).await {
                Ok(count) => removed += count,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "path invalidation failed");
                }
            }
        }
        removed
    }

    /// Invalidates every entry filed under `group`.
    pub async fn invalidate_group(&self, group: &str) -> Result<u64, StoreError> {
        self.purge_pattern(&format!("{CACHE_PREFIX}:{group}:*:*")).await
    }

    /// Invalidates several groups concurrently. A failure in one group is
    /// logged and does not abort the others.
    pub async fn invalidate_groups(&self, groups: &[&str]) -> u64 {
        let results = join_all(groups.iter().map(|g| self.invalidate_group(g))).await;
        let mut removed = 0;
        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(count) => removed += count,
                Err(e) => {
                    tracing::warn!(group = %group, error = %e, "group invalidation failed");
                }
            }
        }
        removed
    }

    /// Invalidates one caller's entries, either in the named groups or,
    /// with `None`, across all of them.
    pub async fn invalidate_caller(
        &self,
        caller: &str,
        groups: Option<&[&str]>,
    ) -> Result<u64, StoreError> {
        match groups {
            None => {
                self.purge_pattern(&format!("{CACHE_PREFIX}:*:*:{caller}:*"))
                    .await
            }
            Some(groups) => {
                let mut removed = 0;
                for group in groups {
                    removed += self
                        .purge_pattern(&format!("{CACHE_PREFIX}:{group}:*:{caller}:*"))
                        .await?;
                }
                Ok(removed)
            }
        }
    }

    /// Deletes cache entries written more than `max_age` ago, plus any
    /// entry whose envelope no longer decodes. Keys that vanish or fail to
    /// read mid-sweep are skipped, not fatal.
    pub async fn sweep_older_than(&self, max_age: Duration) -> Result<SweepStats, StoreError> {
        let keys = self.matching_keys(&format!("{CACHE_PREFIX}:*")).await?;
        let cutoff = epoch_ms_now() - max_age.as_millis() as i64;

        let mut doomed = Vec::new();
        for key in &keys {
            match self.store.get(key).await {
                Ok(Some(bytes)) => match CacheEntry::decode(&bytes) {
                    Ok(entry) if entry.stored_at_epoch_ms < cutoff => doomed.push(key.clone()),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "undecodable entry swept");
                        doomed.push(key.clone());
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "sweep read failed, key skipped");
                }
            }
        }

        let removed = self.delete_keys(&doomed).await?;
        Ok(SweepStats { scanned: keys.len() as u64, removed })
    }
}
