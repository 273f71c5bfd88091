//! Remote Health Monitor
//!
//! Background task that probes the remote tier and converts the outcome into
//! connection health signals, so the tiered cache falls back to the local
//! store while the remote store is down and returns to it once it recovers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::RemoteStore;

/// Spawns a task probing `remote` every `interval`.
///
/// The first probe runs immediately. The returned handle should be aborted
/// during shutdown.
pub fn spawn_health_monitor(remote: RemoteStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting remote cache health monitor"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            remote.probe().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RemoteBackend;
    use crate::error::{CacheError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Backend whose only behavior is whether PING succeeds.
    #[derive(Default)]
    struct PingBackend {
        up: AtomicBool,
    }

    #[async_trait]
    impl RemoteBackend for PingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl_seconds: u64) -> Result<()> {
            Ok(())
        }

        async fn del(&self, _keys: &[String]) -> Result<u64> {
            Ok(0)
        }

        async fn exists(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }

        async fn scan(&self, _pattern: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn info(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn ping(&self) -> Result<()> {
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(CacheError::Remote("connection refused".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_monitor_follows_backend_health() {
        let backend = Arc::new(PingBackend::default());
        let remote = RemoteStore::new(backend.clone());
        backend.up.store(true, Ordering::SeqCst);

        let handle = spawn_health_monitor(remote.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(remote.is_available());

        backend.up.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!remote.is_available());

        backend.up.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(remote.is_available());

        handle.abort();
    }
}
