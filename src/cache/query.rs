//! Query Cache Module
//!
//! Read-through caching for expensive aggregate queries.
//!
//! Concurrent misses on the same key are not coalesced: each caller runs its
//! own computation and the last write wins.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheReport, KeyBuilder, RemoteInfo, RemoteStore, TieredCache, Ttl};
use crate::config::Config;

// == Query Options ==
/// Per-call caching options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Lifetime of the cached result; the configured default when `None`
    pub ttl: Option<Ttl>,
    /// When false the computation always runs and the cache is untouched
    pub use_cache: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            use_cache: true,
        }
    }
}

impl QueryOptions {
    pub fn with_ttl(ttl: Ttl) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }
}

// == Query Cache ==
/// Shared handle to the cache, injected into request handlers.
///
/// Cloning is cheap; all clones share the same tiers.
#[derive(Debug, Clone)]
pub struct QueryCache {
    cache: Arc<TieredCache>,
    default_ttl: u64,
}

impl QueryCache {
    pub fn new(cache: TieredCache, default_ttl: u64) -> Self {
        Self {
            cache: Arc::new(cache),
            default_ttl,
        }
    }

    /// Builds the cache from configuration, using `remote` as the primary
    /// tier when given.
    pub fn from_config(config: &Config, remote: Option<RemoteStore>) -> Self {
        let keys = KeyBuilder::new(&config.app_namespace);
        let cache = match remote {
            Some(remote) => TieredCache::with_remote(keys, remote),
            None => TieredCache::local_only(keys),
        };
        Self::new(cache, config.default_ttl)
    }

    pub fn tiered(&self) -> &TieredCache {
        &self.cache
    }

    /// Builds a key under this cache's application namespace.
    pub fn key(&self, namespace: impl AsRef<str>, parts: &[&dyn Display]) -> String {
        self.cache.keys().build_key(namespace, parts)
    }

    // == Lifecycle ==
    pub fn start(&self) {
        self.cache.start();
        info!(default_ttl = self.default_ttl, "Query cache started");
    }

    pub fn destroy(&self) {
        self.cache.destroy();
        info!("Query cache destroyed");
    }

    // == Cached Query ==
    /// Returns the cached value for `key`, or runs `compute` and caches its
    /// result.
    ///
    /// Errors from `compute` are returned unchanged and nothing is cached.
    /// On a miss, the computation and the write-back run on a spawned task,
    /// so dropping the returned future does not cancel them.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from `compute`.
    pub async fn cached_query<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        options: QueryOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        E: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if !options.use_cache || !self.cache.is_usable() {
            debug!(key = %key, "cache bypassed");
            return compute().await;
        }

        if let Some(hit) = self.cache.get::<T>(key).await {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }
        debug!(key = %key, "cache miss");

        let ttl = options.ttl.map_or(self.default_ttl, Ttl::seconds);
        let cache = Arc::clone(&self.cache);
        let key = key.to_string();

        let task = tokio::spawn(async move {
            let value = compute().await?;
            if !cache.set(&key, &value, ttl).await {
                debug!(key = %key, "cache write skipped");
            }
            Ok::<_, E>(value)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }

    // == Invalidation ==
    /// Invalidates each namespace on the active tier. Returns the total
    /// number of keys removed.
    pub async fn invalidate_namespaces<I>(&self, namespaces: I) -> u64
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut removed = 0;
        for namespace in namespaces {
            removed += self.cache.invalidate_namespace(namespace).await;
        }
        info!(removed, "Cache namespaces invalidated");
        removed
    }

    // == Stats ==
    /// Tier health plus whatever counters the tiers can report.
    pub async fn stats(&self) -> CacheReport {
        let local = self.cache.local().stats();
        let remote = self.cache.remote();
        let remote_info = match remote {
            Some(remote) => remote.info().await,
            None => None,
        };

        CacheReport {
            remote_configured: remote.is_some(),
            remote_available: remote.is_some_and(RemoteStore::is_available),
            active_tier: self.cache.active_tier(),
            local_hit_rate: local.hit_rate(),
            local_sweeping: self.cache.local().is_sweeping(),
            local,
            remote_hit_rate: remote_info.as_ref().and_then(RemoteInfo::hit_rate),
            remote: remote_info,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Namespace;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct StockLevel {
        sku: String,
        on_hand: u32,
    }

    fn query_cache() -> QueryCache {
        QueryCache::new(TieredCache::local_only(KeyBuilder::new("inventory")), 300)
    }

    fn levels() -> Vec<StockLevel> {
        vec![StockLevel {
            sku: "SKU-1".to_string(),
            on_hand: 7,
        }]
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = query_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = cache.key(Namespace::StockLevels, &[&"page1"]);

        for _ in 0..2 {
            let calls = calls.clone();
            let result: Result<Vec<StockLevel>, String> = cache
                .cached_query(
                    &key,
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(levels())
                    },
                    QueryOptions::default(),
                )
                .await;
            assert_eq!(result.unwrap(), levels());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_always_computes_and_never_writes() {
        let cache = query_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let result: Result<u32, String> = cache
                .cached_query(
                    "inventory:summary_metrics",
                    move || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) as u32) },
                    QueryOptions::uncached(),
                )
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.tiered().local().is_empty());
        let stats = cache.tiered().local().stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_and_is_not_cached() {
        let cache = query_cache();

        let result: Result<u32, String> = cache
            .cached_query(
                "inventory:inventory_value",
                || async { Err("database offline".to_string()) },
                QueryOptions::default(),
            )
            .await;

        assert_eq!(result, Err("database offline".to_string()));
        assert!(cache.tiered().local().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_ttl_is_applied() {
        let cache = query_cache();

        let _: Result<u32, String> = cache
            .cached_query(
                "inventory:low_stock_alerts",
                || async { Ok(3) },
                QueryOptions::with_ttl(Ttl::Short),
            )
            .await;

        assert!(cache.tiered().local().exists("inventory:low_stock_alerts"));
    }

    #[tokio::test]
    async fn test_destroyed_cache_computes_directly() {
        let cache = query_cache();
        cache.destroy();

        let result: Result<u32, String> = cache
            .cached_query("inventory:product_list", || async { Ok(9) }, QueryOptions::default())
            .await;

        assert_eq!(result, Ok(9));
        assert!(cache.tiered().local().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_call_still_writes_result() {
        let cache = query_cache();
        let key = "inventory:category_breakdown".to_string();

        let call = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _: Result<u32, String> = cache
                    .cached_query(
                        &key,
                        || async {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(11)
                        },
                        QueryOptions::default(),
                    )
                    .await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        call.abort();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(cache.tiered().get::<u32>(&key).await, Some(11));
    }

    #[tokio::test]
    async fn test_invalidate_namespaces_removes_only_named() {
        let cache = query_cache();
        let stock = cache.key(Namespace::StockLevels, &[&"p1"]);
        let summary = cache.key(Namespace::SummaryMetrics, &[&"p1"]);
        let products = cache.key(Namespace::ProductList, &[&"p1"]);
        for key in [&stock, &summary, &products] {
            cache.tiered().set(key, &1u32, 60).await;
        }

        let removed = cache
            .invalidate_namespaces([Namespace::StockLevels, Namespace::SummaryMetrics])
            .await;

        assert_eq!(removed, 2);
        assert!(cache.tiered().exists(&products).await);
    }

    #[tokio::test]
    async fn test_stats_without_remote() {
        let cache = query_cache();
        cache.tiered().set("inventory:stock_levels:a", &1u32, 60).await;

        let report = cache.stats().await;

        assert!(!report.remote_configured);
        assert!(!report.remote_available);
        assert_eq!(report.active_tier, crate::cache::Tier::Local);
        assert_eq!(report.local.total_entries, 1);
        assert!(!report.local_sweeping);
        assert!(report.remote_hit_rate.is_none());
        assert!(report.remote.is_none());

        cache.start();
        assert!(cache.stats().await.local_sweeping);
        cache.destroy();
    }
}
