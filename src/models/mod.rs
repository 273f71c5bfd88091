//! Request and Response models for the cache admin API
//!
//! DTOs serialized to and from the admin endpoints' JSON bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::InvalidateRequest;
pub use responses::{HealthResponse, InvalidateResponse, NamespacesResponse};
