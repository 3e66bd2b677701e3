//! # reserva-store
//!
//! Shared key-value store abstraction for the Reserva gateway.
//!
//! Every gateway instance coordinates through one network-accessible store:
//! response cache entries, rate-limit counters, nothing else. The store
//! contract is narrow on purpose (atomic increment, per-key TTL, single-key
//! get/set-with-expiry and cursor-paginated pattern scans) and is the single
//! source of truth for cross-instance state.
//!
//! Two backends are provided:
//!
//! - [`RedisSharedStore`]: production backend over a deadpool-redis pool.
//! - [`MemorySharedStore`]: in-process backend with the same observable
//!   semantics, used by tests and single-instance deployments.
//!
//! There is deliberately no "delete by pattern" primitive: callers iterate
//! [`SharedStore::scan_page`] to completion and batch-delete each page.

mod error;
mod memory;
mod redis_store;
mod traits;

pub use error::StoreError;
pub use memory::MemorySharedStore;
pub use redis_store::RedisSharedStore;
pub use traits::{CounterHit, ScanPage, SharedStore};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shared store trait object.
pub type DynSharedStore = std::sync::Arc<dyn SharedStore>;
