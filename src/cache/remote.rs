//! Remote Store Module
//!
//! Primary cache tier. [`RemoteStore`] wraps a networked key-value backend
//! and never lets a backend failure escape: every operation degrades to a
//! neutral value (`None`, `false`, `0`) and the failure is logged. Every
//! backend call is bounded by a timeout; a call that runs out of time also
//! marks the store unavailable until the next successful probe.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::{RemoteInfo, PATTERN_DELETE_BATCH, REMOTE_OP_TIMEOUT_MS};
use crate::error::{CacheError, Result};

// == Backend Trait ==
/// Raw operations of the networked key-value service.
///
/// Implementations report failures as errors; [`RemoteStore`] absorbs them.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` with an expiry of `ttl_seconds`.
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Deletes `keys`, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Enumerates keys matching a glob pattern.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>>;

    /// Server diagnostics text (`INFO` for Redis).
    async fn info(&self) -> Result<String>;

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;
}

// == Connection Events ==
/// Health signals emitted by the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Error(String),
    Disconnected,
}

// == Remote Store ==
/// Availability-gated wrapper over a [`RemoteBackend`].
///
/// The store starts unavailable; a [`ConnectionEvent::Connected`] signal
/// opens it for traffic.
#[derive(Clone)]
pub struct RemoteStore {
    backend: Arc<dyn RemoteBackend>,
    available: Arc<AtomicBool>,
    op_timeout: Duration,
}

impl RemoteStore {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self::with_timeout(backend, Duration::from_millis(REMOTE_OP_TIMEOUT_MS))
    }

    /// Creates a store whose backend calls give up after `op_timeout`.
    pub fn with_timeout(backend: Arc<dyn RemoteBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            available: Arc::new(AtomicBool::new(false)),
            op_timeout,
        }
    }

    /// Current connection health.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    // == Health Signals ==
    /// Applies a health signal to the availability flag.
    pub fn handle_event(&self, event: ConnectionEvent) {
        let now_available = matches!(event, ConnectionEvent::Connected);
        let was_available = self.available.swap(now_available, Ordering::AcqRel);

        match (&event, was_available) {
            (ConnectionEvent::Connected, false) => info!("Remote cache connected"),
            (ConnectionEvent::Error(reason), true) => {
                warn!(error = %reason, "Remote cache error, falling back to local store")
            }
            (ConnectionEvent::Disconnected, true) => {
                warn!("Remote cache disconnected, falling back to local store")
            }
            (ConnectionEvent::Error(reason), false) => {
                debug!(error = %reason, "Remote cache still unavailable")
            }
            _ => {}
        }
    }

    /// Runs one backend call under the operation timeout.
    async fn call<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                let err = CacheError::Timeout(self.op_timeout);
                self.handle_event(ConnectionEvent::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Pings the backend and feeds the outcome back as a health signal.
    ///
    /// Unlike the data operations this runs regardless of availability, so
    /// it can detect recovery.
    pub async fn probe(&self) -> bool {
        match self.call(self.backend.ping()).await {
            Ok(()) => {
                self.handle_event(ConnectionEvent::Connected);
                true
            }
            Err(e) => {
                self.handle_event(ConnectionEvent::Error(e.to_string()));
                false
            }
        }
    }

    // == Get ==
    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_available() {
            return None;
        }
        match self.call(self.backend.get(key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Remote GET failed");
                None
            }
        }
    }

    // == Set ==
    /// Stores a payload; a zero TTL is stored as one second.
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.call(self.backend.set_ex(key, value, ttl_seconds.max(1))).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Remote SET failed");
                false
            }
        }
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> bool {
        self.delete_many(&[key.to_string()]).await > 0
    }

    pub async fn delete_many(&self, keys: &[String]) -> u64 {
        if keys.is_empty() || !self.is_available() {
            return 0;
        }
        match self.call(self.backend.del(keys)).await {
            Ok(count) => count,
            Err(e) => {
                warn!(keys = keys.len(), error = %e, "Remote DEL failed");
                0
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.call(self.backend.exists(key)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %key, error = %e, "Remote EXISTS failed");
                false
            }
        }
    }

    // == Pattern Delete ==
    /// Deletes every key matching `pattern` in batches.
    ///
    /// Best effort: a failed batch is logged and skipped, and the return
    /// value counts only keys actually removed.
    pub async fn pattern_delete(&self, pattern: &str) -> u64 {
        if !self.is_available() {
            return 0;
        }
        let keys = match self.call(self.backend.scan(pattern)).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Remote SCAN failed");
                return 0;
            }
        };

        let mut removed = 0;
        for batch in keys.chunks(PATTERN_DELETE_BATCH) {
            match self.call(self.backend.del(batch)).await {
                Ok(count) => removed += count,
                Err(e) => warn!(
                    pattern = %pattern,
                    batch = batch.len(),
                    error = %e,
                    "Remote DEL batch failed"
                ),
            }
        }
        debug!(pattern = %pattern, matched = keys.len(), removed, "Remote pattern delete");
        removed
    }

    // == Info ==
    /// Diagnostics counters, or `None` when unavailable or the call failed.
    pub async fn info(&self) -> Option<RemoteInfo> {
        if !self.is_available() {
            return None;
        }
        match self.call(self.backend.info()).await {
            Ok(text) => Some(RemoteInfo::parse(&text)),
            Err(e) => {
                warn!(error = %e, "Remote INFO failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("available", &self.is_available())
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}
