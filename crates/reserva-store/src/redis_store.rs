//! Redis-backed shared store.
//!
//! Production backend: every gateway instance points at the same Redis and
//! all cross-instance coordination (cache entries, rate-limit windows) goes
//! through it. Commands map one-to-one onto the trait; the INCR + TTL pair
//! runs inside a MULTI/EXEC pipeline so the counter value and its remaining
//! TTL come back from a single atomic round-trip.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::traits::{CounterHit, ScanPage, SharedStore};

/// Shared store over a deadpool-redis connection pool.
#[derive(Clone)]
pub struct RedisSharedStore {
    pool: Pool,
}

impl RedisSharedStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a store from a connection URL.
    pub fn from_url(
        url: &str,
        pool_size: usize,
        wait_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut cfg = Config::from_url(url);
        let mut pool_cfg = PoolConfig::new(pool_size);
        pool_cfg.timeouts.wait = Some(wait_timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::connection(format!("failed to create Redis pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Pings the store; used by the readiness endpoint.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::command(format!("PING failed: {e}")))
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::connection(format!("failed to get Redis connection: {e}")))
    }
}

#[async_trait]
impl SharedStore for RedisSharedStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| StoreError::command(format!("GET {key} failed: {e}")))
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| StoreError::command(format!("SETEX {key} failed: {e}")))
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        conn.del::<_, u64>(keys)
            .await
            .map_err(|e| StoreError::command(format!("DEL failed: {e}")))
    }

    async fn incr_with_ttl(&self, key: &str) -> Result<CounterHit, StoreError> {
        let mut conn = self.connection().await?;
        let (value, ttl_secs): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::command(format!("INCR/TTL {key} failed: {e}")))?;
        Ok(CounterHit { value, ttl_secs })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        conn.expire::<_, bool>(key, ttl.as_secs() as i64)
            .await
            .map_err(|e| StoreError::command(format!("EXPIRE {key} failed: {e}")))
    }

    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        let mut conn = self.connection().await?;
        let (cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::command(format!("SCAN {pattern} failed: {e}")))?;
        Ok(ScanPage { cursor, keys })
    }
}
