//! Cache Statistics Module
//!
//! Counters for the in-process tier, remote diagnostics parsed from the
//! store's `INFO` text, and the combined report handed to request handlers.

use serde::Serialize;

use super::Tier;

// == Local Stats ==
/// Tracks fallback-tier performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl LocalStats {
    // == Constructor ==
    /// Creates a new LocalStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Remote Info ==
/// Counters reported by the remote store. Fields absent from the
/// diagnostics text stay `None` and are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_memory_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyspace_hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyspace_misses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_clients: Option<u64>,
}

impl RemoteInfo {
    /// Parses `field:value` lines out of Redis `INFO` output.
    ///
    /// Section headers, blank lines and unknown fields are ignored.
    pub fn parse(info: &str) -> Self {
        let mut parsed = Self::default();
        for line in info.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            match field {
                "used_memory_human" => parsed.used_memory_human = Some(value.to_string()),
                "keyspace_hits" => parsed.keyspace_hits = value.parse().ok(),
                "keyspace_misses" => parsed.keyspace_misses = value.parse().ok(),
                "connected_clients" => parsed.connected_clients = value.parse().ok(),
                _ => {}
            }
        }
        parsed
    }

    /// Remote hit rate, when both counters were reported.
    pub fn hit_rate(&self) -> Option<f64> {
        let (hits, misses) = (self.keyspace_hits?, self.keyspace_misses?);
        let total = hits + misses;
        Some(if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        })
    }
}

// == Cache Report ==
/// Snapshot returned by `QueryCache::stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    /// Whether a remote tier is configured at all
    pub remote_configured: bool,
    /// Current remote health flag
    pub remote_available: bool,
    /// Tier that currently answers reads and writes
    pub active_tier: Tier,
    /// Fallback tier counters
    pub local: LocalStats,
    /// Fallback tier hit rate
    pub local_hit_rate: f64,
    /// Whether the fallback tier's expiry sweep is scheduled
    pub local_sweeping: bool,
    /// Remote keyspace hit rate, when the remote tier reported both counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_hit_rate: Option<f64>,
    /// Remote counters, present only while the remote tier answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteInfo>,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_INFO: &str = "# Server\r\nredis_version:7.2.4\r\n\r\n# Clients\r\nconnected_clients:3\r\n\r\n# Memory\r\nused_memory:1048576\r\nused_memory_human:1.00M\r\n\r\n# Stats\r\nkeyspace_hits:120\r\nkeyspace_misses:30\r\n";

    #[test]
    fn test_local_stats_new() {
        let stats = LocalStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(LocalStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = LocalStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_expirations() {
        let mut stats = LocalStats::new();
        stats.record_expirations(2);
        stats.record_expirations(3);
        assert_eq!(stats.expirations, 5);
    }

    #[test]
    fn test_parse_remote_info() {
        let info = RemoteInfo::parse(SAMPLE_INFO);
        assert_eq!(info.used_memory_human.as_deref(), Some("1.00M"));
        assert_eq!(info.keyspace_hits, Some(120));
        assert_eq!(info.keyspace_misses, Some(30));
        assert_eq!(info.connected_clients, Some(3));
        assert_eq!(info.hit_rate(), Some(0.8));
    }

    #[test]
    fn test_parse_partial_info_omits_missing_fields() {
        let info = RemoteInfo::parse("# Stats\nkeyspace_hits:7\n");
        assert_eq!(info.keyspace_hits, Some(7));
        assert!(info.keyspace_misses.is_none());
        assert!(info.hit_rate().is_none());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"keyspace_hits": 7}));
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert_eq!(RemoteInfo::parse("not info at all"), RemoteInfo::default());
    }
}
