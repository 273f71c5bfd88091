//! Local Store Module
//!
//! In-process fallback tier: a TTL-aware map guarded by a single mutex, with
//! lazy expiry on read and a periodic background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{glob_match, CacheEntry, LocalStats, LOCAL_SWEEP_INTERVAL_SECS};
use crate::tasks::spawn_sweep_task;

#[derive(Debug, Default)]
struct LocalState {
    entries: HashMap<String, CacheEntry>,
    stats: LocalStats,
    destroyed: bool,
}

// == Local Store ==
/// Fallback cache tier. Cloning yields another handle to the same map.
///
/// All operations are synchronous and never suspend; the map, its counters
/// and the sweep share one lock, so every operation is atomic per key.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    state: Arc<Mutex<LocalState>>,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LocalStore {
    // == Constructor ==
    /// Creates an empty store. The sweep does not run until [`LocalStore::start`].
    pub fn new() -> Self {
        Self::default()
    }

    // == Lifecycle ==
    /// Starts the background sweep at the fixed production interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        self.start_with_interval(Duration::from_secs(LOCAL_SWEEP_INTERVAL_SECS));
    }

    /// Starts the background sweep at a custom interval, replacing any
    /// sweep already running.
    ///
    /// Lock order is `sweeper` then `state`, shared with [`LocalStore::destroy`],
    /// so a sweep can never be installed after the store is destroyed.
    pub fn start_with_interval(&self, interval: Duration) {
        let mut sweeper = self.sweeper.lock();
        if self.state.lock().destroyed {
            debug!("Local store destroyed, sweep not started");
            return;
        }
        let handle = spawn_sweep_task(self.clone(), interval);
        if let Some(previous) = sweeper.replace(handle) {
            previous.abort();
        }
    }

    /// Cancels the sweep and drops every entry. The store refuses writes
    /// afterwards.
    pub fn destroy(&self) {
        let mut sweeper = self.sweeper.lock();
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.stats.set_total_entries(0);
        state.destroyed = true;
        info!(dropped, "Local cache store destroyed");
    }

    /// False once the store has been destroyed.
    pub fn is_active(&self) -> bool {
        !self.state.lock().destroyed
    }

    /// Whether the background sweep is currently scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Get ==
    /// Returns the stored payload, or `None` when missing or expired.
    ///
    /// An expired entry found here is removed on the spot.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.entries.get(key) {
            Some(entry) if !entry.is_expired_at(current_timestamp_ms()) => {
                let value = entry.value.clone();
                state.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                state.entries.remove(key);
                state.stats.record_expirations(1);
                state.stats.record_miss();
                state.stats.set_total_entries(state.entries.len());
                debug!(key = %key, "local cache entry expired on read");
                None
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a payload for `ttl_seconds`, overwriting any previous entry.
    ///
    /// A zero TTL is stored as one second. Returns false once destroyed.
    pub fn set(&self, key: &str, value: String, ttl_seconds: u64) -> bool {
        let mut state = self.state.lock();
        if state.destroyed {
            return false;
        }
        state
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl_seconds.max(1)));
        let total = state.entries.len();
        state.stats.set_total_entries(total);
        true
    }

    // == Delete ==
    /// Removes an entry, reporting whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let removed = state.entries.remove(key).is_some();
        let total = state.entries.len();
        state.stats.set_total_entries(total);
        removed
    }

    /// True when a live entry exists. Does not touch hit/miss counters.
    pub fn exists(&self, key: &str) -> bool {
        let now = current_timestamp_ms();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Pattern Delete ==
    /// Removes every entry whose key matches `pattern`; returns the count.
    pub fn pattern_delete(&self, pattern: &str) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !glob_match(pattern, key));
        let after = state.entries.len();
        state.stats.set_total_entries(after);
        before - after
    }

    // == Sweep ==
    /// Removes all expired entries. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        let after = state.entries.len();
        let removed = before - after;
        state.stats.record_expirations(removed);
        state.stats.set_total_entries(after);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> LocalStats {
        self.state.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_set_and_get() {
        let store = LocalStore::new();

        assert!(store.set("inventory:stock_levels:p1", "[1,2]".to_string(), 60));
        assert_eq!(store.get("inventory:stock_levels:p1").as_deref(), Some("[1,2]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = LocalStore::new();
        assert!(store.get("missing").is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_overwrite() {
        let store = LocalStore::new();

        store.set("k", "v1".to_string(), 60);
        store.set("k", "v2".to_string(), 60);

        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_reports_existence() {
        let store = LocalStore::new();

        store.set("k", "v".to_string(), 60);
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_lazy_expiry_removes_entry() {
        let store = LocalStore::new();

        store.set("k", "v".to_string(), 1);
        assert!(store.exists("k"));

        sleep(Duration::from_millis(1100));

        assert!(!store.exists("k"));
        assert!(store.get("k").is_none());
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_zero_ttl_is_one_second() {
        let store = LocalStore::new();
        store.set("k", "v".to_string(), 0);
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_sweep_expired() {
        let store = LocalStore::new();

        store.set("short", "v".to_string(), 1);
        store.set("long", "v".to_string(), 60);

        sleep(Duration::from_millis(1100));

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").is_some());
    }

    #[test]
    fn test_pattern_delete() {
        let store = LocalStore::new();

        store.set("inventory:stock_levels:a", "1".to_string(), 60);
        store.set("inventory:stock_levels:b", "2".to_string(), 60);
        store.set("inventory:summary_metrics:a", "3".to_string(), 60);

        assert_eq!(store.pattern_delete("inventory:stock_levels:*"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("inventory:summary_metrics:a").is_some());
    }

    #[test]
    fn test_stats_track_hits_and_entries() {
        let store = LocalStore::new();

        store.set("k", "v".to_string(), 60);
        store.get("k");
        store.get("nope");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_destroy_clears_and_refuses_writes() {
        let store = LocalStore::new();
        store.set("k", "v".to_string(), 60);

        store.destroy();

        assert!(store.is_empty());
        assert!(!store.is_active());
        assert!(!store.set("k", "v".to_string(), 60));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = LocalStore::new();
        let other = store.clone();

        store.set("k", "v".to_string(), 60);
        assert_eq!(other.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let store = LocalStore::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(&format!("k{t}-{i}"), i.to_string(), 60);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
        assert_eq!(store.get("k7-99").as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn test_start_and_destroy_sweeper() {
        let store = LocalStore::new();

        store.start();
        assert!(store.is_sweeping());

        store.destroy();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.is_sweeping());
    }

    #[tokio::test]
    async fn test_start_after_destroy_is_ignored() {
        let store = LocalStore::new();
        store.destroy();

        store.start();
        assert!(!store.is_sweeping());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_start_racing_destroy_leaves_no_sweep() {
        for _ in 0..50 {
            let store = LocalStore::new();
            let starters: Vec<_> = (0..4)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store.start_with_interval(Duration::from_secs(60));
                    })
                })
                .collect();
            let destroyer = {
                let store = store.clone();
                tokio::spawn(async move { store.destroy() })
            };

            for starter in starters {
                starter.await.unwrap();
            }
            destroyer.await.unwrap();

            assert!(!store.is_active());
            assert!(store.sweeper.lock().is_none());
        }
    }
}
