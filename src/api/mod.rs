//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Tier health
//! - `GET /cache/stats` - Cache statistics
//! - `POST /cache/invalidate` - Clear dataset namespaces
//! - `GET /cache/namespaces` - List known namespaces

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
