//! Redis implementation of [`RemoteBackend`].

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ConnectionInfo};
use tokio::sync::OnceCell;
use tracing::info;

use crate::cache::RemoteBackend;
use crate::error::{CacheError, Result};

/// Number of keys requested per SCAN round trip.
const SCAN_COUNT: usize = 200;

/// Redis backend over a self-reconnecting multiplexed connection.
///
/// The connection is opened on first use, so a server that is down at
/// startup is picked up by the first probe that reaches it.
pub struct RedisBackend {
    client: Client,
    timeout: Duration,
    conn: OnceCell<ConnectionManager>,
}

impl RedisBackend {
    /// Creates the backend without touching the network. `timeout` bounds
    /// both connecting and each command's response.
    pub fn new(info: ConnectionInfo, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::open(info)?,
            timeout,
            conn: OnceCell::new(),
        })
    }

    /// Shared connection, opened on first success. A failed attempt leaves
    /// the cell empty so the next call retries.
    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_connection_timeout(self.timeout)
                    .set_response_timeout(self.timeout);
                let conn = ConnectionManager::new_with_config(self.client.clone(), config).await?;
                info!("Connected to Redis");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl RemoteBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once across iterations.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn info(&self) -> Result<String> {
        let mut conn = self.connection().await?;
        let text: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(text)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
