//! Read-through response caching over the shared store.
//!
//! ## Cache Key Format
//!
//! `cache:{group}:{routePath}:{callerIdOrAnonymous}:{base64(sorted query JSON)}`
//!
//! ## Philosophy
//!
//! The cache must never add latency or failure modes to the request path:
//! reads that fail degrade to misses, writes are fire-and-forget, and a
//! burst of concurrent first-requesters all independently miss and all
//! invoke the handler (no single-flight de-duplication). Freshness is
//! delegated entirely to the store's per-key TTL; a daily sweep provides a
//! second line of defense against entries the TTL never reclaimed.

pub mod entry;
pub mod invalidate;
pub mod key;
pub mod layer;
pub mod sweep;

pub use entry::{CacheEntry, epoch_ms_now};
pub use invalidate::{CacheInvalidator, SweepStats};
pub use key::{ANONYMOUS_CALLER, cache_key, query_digest};
pub use layer::response_cache;
pub use sweep::spawn_sweeper;
