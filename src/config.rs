//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use crate::cache::{Ttl, REMOTE_OP_TIMEOUT_MS};

/// Cache and admin server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to connect to the remote tier at all
    pub redis_enabled: bool,
    /// Remote store host
    pub redis_host: String,
    /// Remote store port
    pub redis_port: u16,
    /// Optional remote store password
    pub redis_password: Option<String>,
    /// Remote store database index
    pub redis_db: i64,
    /// Interval in seconds between remote health probes
    pub health_check_interval: u64,
    /// Bound in milliseconds on connecting and on each remote round trip
    pub redis_timeout_ms: u64,
    /// Default TTL in seconds for writes without an explicit TTL
    pub default_ttl: u64,
    /// Application namespace prefixed to every cache key
    pub app_namespace: String,
    /// HTTP admin server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_ENABLED` - Connect to Redis (default: true)
    /// - `REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_PASSWORD` - Redis password (default: unset)
    /// - `REDIS_DB` - Redis database index (default: 0)
    /// - `REDIS_HEALTH_INTERVAL` - Health probe frequency in seconds (default: 5)
    /// - `REDIS_TIMEOUT_MS` - Remote connect and command timeout (default: 2000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_NAMESPACE` - Key prefix (default: inventory)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_enabled: env_or("REDIS_ENABLED", defaults.redis_enabled),
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: env_or("REDIS_PORT", defaults.redis_port),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            redis_db: env_or("REDIS_DB", defaults.redis_db),
            health_check_interval: env_or("REDIS_HEALTH_INTERVAL", defaults.health_check_interval),
            redis_timeout_ms: env_or("REDIS_TIMEOUT_MS", defaults.redis_timeout_ms),
            default_ttl: env_or("CACHE_DEFAULT_TTL", defaults.default_ttl),
            app_namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(defaults.app_namespace),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Connection parameters for the remote store.
    ///
    /// Built field by field, so passwords need no URL escaping.
    pub fn redis_connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.redis_host.clone(), self.redis_port),
            redis: RedisConnectionInfo {
                db: self.redis_db,
                password: self.redis_password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_enabled: true,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_db: 0,
            health_check_interval: 5,
            redis_timeout_ms: REMOTE_OP_TIMEOUT_MS,
            default_ttl: Ttl::Medium.seconds(),
            app_namespace: "inventory".to_string(),
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
