//! Tiered Cache Module
//!
//! Façade over the remote and local tiers. Each call goes to exactly one
//! tier: the remote store while it reports itself available, the local
//! store otherwise. The tiers are not synchronized, so a tier switch starts
//! from a cold cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{decode, encode, KeyBuilder, LocalStore, RemoteStore};

/// The tier answering a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Remote,
    Local,
}

// == Tiered Cache ==
#[derive(Debug)]
pub struct TieredCache {
    keys: KeyBuilder,
    local: LocalStore,
    remote: Option<RemoteStore>,
}

impl TieredCache {
    /// Creates a cache backed by the local tier only.
    pub fn local_only(keys: KeyBuilder) -> Self {
        Self {
            keys,
            local: LocalStore::new(),
            remote: None,
        }
    }

    /// Creates a cache preferring `remote` whenever it is available.
    pub fn with_remote(keys: KeyBuilder, remote: RemoteStore) -> Self {
        Self {
            keys,
            local: LocalStore::new(),
            remote: Some(remote),
        }
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn remote(&self) -> Option<&RemoteStore> {
        self.remote.as_ref()
    }

    // == Lifecycle ==
    /// Starts the local tier's background sweep.
    pub fn start(&self) {
        self.local.start();
    }

    /// Stops the sweep and drops all local entries.
    pub fn destroy(&self) {
        self.local.destroy();
    }

    // == Tier Selection ==
    fn available_remote(&self) -> Option<&RemoteStore> {
        self.remote.as_ref().filter(|remote| remote.is_available())
    }

    pub fn active_tier(&self) -> Tier {
        if self.available_remote().is_some() {
            Tier::Remote
        } else {
            Tier::Local
        }
    }

    /// Whether any tier can currently serve reads and writes.
    pub fn is_usable(&self) -> bool {
        self.available_remote().is_some() || self.local.is_active()
    }

    // == Get ==
    /// Reads and decodes a value. Payloads that fail to decode count as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.available_remote() {
            Some(remote) => remote.get(key).await,
            None => self.local.get(key),
        }?;

        match decode(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cache payload");
                None
            }
        }
    }

    // == Set ==
    /// Encodes and stores a value. Returns false when nothing was written.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) -> bool {
        let payload = match encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping cache write for unencodable value");
                return false;
            }
        };

        match self.available_remote() {
            Some(remote) => remote.set(key, &payload, ttl_seconds).await,
            None => self.local.set(key, payload, ttl_seconds),
        }
    }

    // == Delete ==
    /// Deletes from the active tier only.
    pub async fn delete(&self, key: &str) -> bool {
        match self.available_remote() {
            Some(remote) => remote.delete(key).await,
            None => self.local.delete(key),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.available_remote() {
            Some(remote) => remote.exists(key).await,
            None => self.local.exists(key),
        }
    }

    // == Invalidate Namespace ==
    /// Removes every key built under `namespace` from the active tier.
    pub async fn invalidate_namespace(&self, namespace: impl AsRef<str>) -> u64 {
        let namespace = namespace.as_ref();
        let pattern = self.keys.namespace_pattern(namespace);
        let root = self.keys.namespace_root(namespace);

        let removed = match self.available_remote() {
            Some(remote) => {
                remote.pattern_delete(&pattern).await + u64::from(remote.delete(&root).await)
            }
            None => {
                self.local.pattern_delete(&pattern) as u64 + u64::from(self.local.delete(&root))
            }
        };

        debug!(namespace = %namespace, removed, "Invalidated cache namespace");
        removed
    }
}
