//! Response DTOs for the cache admin API

use serde::Serialize;

use crate::cache::{Namespace, Tier};

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status; the service is healthy whenever a tier is usable
    pub status: String,
    /// Tier currently serving requests
    pub active_tier: Tier,
    /// Remote tier connection health
    pub remote_available: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(usable: bool, active_tier: Tier, remote_available: bool) -> Self {
        Self {
            status: if usable { "healthy" } else { "degraded" }.to_string(),
            active_tier,
            remote_available,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for namespace invalidation (POST /cache/invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Namespaces that were cleared
    pub namespaces: Vec<String>,
    /// Number of cache entries removed across all namespaces
    pub removed: u64,
    /// Tier the invalidation ran against
    pub tier: Tier,
}

/// Response body listing known namespaces (GET /cache/namespaces)
#[derive(Debug, Clone, Serialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<&'static str>,
}

impl NamespacesResponse {
    pub fn known() -> Self {
        Self {
            namespaces: Namespace::ALL.iter().map(|ns| ns.as_str()).collect(),
        }
    }
}
