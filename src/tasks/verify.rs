//! Consistency Sweep Task
//!
//! Background task that periodically verifies every cached object against
//! the key it is indexed under.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{Cacheable, ObjectCache};

/// Spawns a background task that periodically runs [`ObjectCache::verify`].
///
/// A sweep that finds a corrupted entry leaves the cache invalidated; the
/// task logs it and keeps running.
///
/// # Arguments
/// * `cache` - Arc<RwLock<ObjectCache>> shared reference to the cache
/// * `interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_verify_task<T: Cacheable>(
    cache: Arc<RwLock<ObjectCache<T>>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting consistency sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut cache_guard = cache.write().await;
            match cache_guard.verify() {
                Ok(0) => debug!("Consistency sweep: cache is empty"),
                Ok(verified) => debug!("Consistency sweep: {} entries verified", verified),
                Err(err) => error!("Consistency sweep failed, cache invalidated: {}", err),
            }
        }
    })
}
