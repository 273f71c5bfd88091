//! Inventory Cache - Two-tier query result caching
//!
//! Memoizes expensive inventory aggregates in Redis, falling back to an
//! in-process TTL map whenever Redis is unreachable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{DataChange, Namespace, QueryCache, QueryOptions, Ttl};
pub use config::Config;
pub use error::CacheError;
pub use tasks::{spawn_health_monitor, spawn_sweep_task};
