//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is live.
//!
//! # Tasks
//! - Local sweep: removes expired fallback-tier entries
//! - Health monitor: probes the remote tier and feeds its availability flag

mod health;
mod sweep;

pub use health::spawn_health_monitor;
pub use sweep::spawn_sweep_task;
