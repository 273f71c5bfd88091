//! Local Sweep Task
//!
//! Background task that periodically removes expired fallback-tier entries,
//! bounding growth from keys written once and never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalStore;

/// Spawns a background task that sweeps `store` every `interval`.
///
/// The task runs until aborted; [`LocalStore::destroy`] owns the handle and
/// aborts it during shutdown.
pub fn spawn_sweep_task(store: LocalStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting local cache sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.sweep_expired();

            if removed > 0 {
                info!("Local sweep: removed {} expired entries", removed);
            } else {
                debug!("Local sweep: no expired entries found");
            }
        }
    })
}
