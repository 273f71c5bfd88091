//! Cache Module
//!
//! Two-tier query result caching: a Redis-backed primary tier, an in-process
//! fallback tier, and the read-through layer that sits above both.

mod codec;
mod entry;
mod key;
mod local;
mod namespace;
mod query;
mod redis_backend;
mod remote;
mod stats;
mod tiered;


// Re-export public types
pub use codec::{decode, encode};
pub use entry::CacheEntry;
pub use key::{canonical_params, glob_match, KeyBuilder};
pub use local::LocalStore;
pub use namespace::{DataChange, Namespace};
pub use query::{QueryCache, QueryOptions};
pub use redis_backend::RedisBackend;
pub use remote::{ConnectionEvent, RemoteBackend, RemoteStore};
pub use stats::{CacheReport, LocalStats, RemoteInfo};
pub use tiered::{Tier, TieredCache};

// == Public Constants ==
/// Interval of the fallback tier's expiry sweep, in seconds.
pub const LOCAL_SWEEP_INTERVAL_SECS: u64 = 60;

/// Number of keys removed per DEL during a remote pattern delete.
pub const PATTERN_DELETE_BATCH: usize = 500;

/// Default bound on a single remote round trip, in milliseconds.
pub const REMOTE_OP_TIMEOUT_MS: u64 = 2_000;

// == TTL Policy ==
/// Named cache lifetimes assigned per dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ttl {
    /// Fast-moving data such as live stock levels
    Short,
    /// Default lifetime
    #[default]
    Medium,
    /// Aggregates that change with catalogue edits
    Long,
    /// Near-static reference data
    VeryLong,
}

impl Ttl {
    /// Lifetime in seconds.
    pub const fn seconds(self) -> u64 {
        match self {
            Ttl::Short => 60,
            Ttl::Medium => 300,
            Ttl::Long => 900,
            Ttl::VeryLong => 3600,
        }
    }
}
