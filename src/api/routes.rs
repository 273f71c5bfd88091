//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_handler, namespaces_handler, stats_handler, AppState,
};

/// Creates the admin router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/namespaces", get(namespaces_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
