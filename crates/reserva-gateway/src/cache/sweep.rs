//! Background sweep task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::invalidate::CacheInvalidator;

/// Spawns the periodic cache sweep.
///
/// The first pass runs one full interval after startup, not immediately, so
/// a fleet of restarting gateways does not stampede the store. The task
/// exits when the shutdown signal fires.
pub fn spawn_sweeper(
    invalidator: Arc<CacheInvalidator>,
    interval: Duration,
    max_age: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let first_tick = tokio::time::Instant::now() + interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_tick, interval);
        tracing::info!(
            interval_secs = interval.as_secs(),
            max_age_secs = max_age.as_secs(),
            "cache sweeper started"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match invalidator.sweep_older_than(max_age).await {
                        Ok(stats) => {
                            crate::metrics::record_sweep_removed(stats.removed);
                            tracing::info!(
                                scanned = stats.scanned,
                                removed = stats.removed,
                                "cache sweep complete"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "cache sweep failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("cache sweeper stopped");
                    break;
                }
            }
        }
    })
}
