//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{extract::State, Json};
use tracing::warn;

use crate::cache::{CacheReport, Namespace, QueryCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, InvalidateRequest, InvalidateResponse, NamespacesResponse};

/// Application state shared across all handlers.
///
/// Holds the injected cache handle; the binary owns its lifecycle.
#[derive(Clone)]
pub struct AppState {
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// Creates a local-only AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(QueryCache::from_config(config, None))
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let tiered = state.cache.tiered();
    let remote_available = tiered.remote().is_some_and(|remote| remote.is_available());

    Json(HealthResponse::new(
        tiered.is_usable(),
        tiered.active_tier(),
        remote_available,
    ))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheReport> {
    Json(state.cache.stats().await)
}

/// Handler for POST /cache/invalidate
///
/// Called after mutations that make cached aggregates stale. Unknown
/// namespace names are accepted and logged; they simply match nothing.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let namespaces = req.targets();
    for name in &namespaces {
        if Namespace::parse(name).is_none() {
            warn!(namespace = %name, "Invalidating unknown cache namespace");
        }
    }

    let tier = state.cache.tiered().active_tier();
    let removed = state.cache.invalidate_namespaces(&namespaces).await;

    Ok(Json(InvalidateResponse {
        namespaces,
        removed,
        tier,
    }))
}

/// Handler for GET /cache/namespaces
pub async fn namespaces_handler() -> Json<NamespacesResponse> {
    Json(NamespacesResponse::known())
}
