//! Cache Entry Module
//!
//! Defines the structure for entries held by the in-process tier.

use chrono::Utc;

// == Cache Entry ==
/// A serialized payload with its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` from now.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = i64::try_from(ttl_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks expiry against a clock reading in Unix milliseconds.
    ///
    /// An entry is expired once `now_ms` reaches `expires_at`, so a fully
    /// elapsed TTL is never served.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
