//! Inventory Cache - Two-tier query result caching
//!
//! Runs the cache admin server and owns the cache lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_cache::api::{create_router, AppState};
use inventory_cache::cache::{QueryCache, RedisBackend, RemoteStore};
use inventory_cache::{spawn_health_monitor, Config};

/// Main entry point for the inventory cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the Redis tier; it serves traffic once a probe reaches the server
/// 4. Start the local sweep and the remote health monitor
/// 5. Serve the admin API until SIGINT/SIGTERM
/// 6. Stop background tasks and destroy the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting inventory cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis_enabled={}, redis={}:{}/{}, default_ttl={}s, namespace={}, port={}",
        config.redis_enabled,
        config.redis_host,
        config.redis_port,
        config.redis_db,
        config.default_ttl,
        config.app_namespace,
        config.server_port
    );

    let remote = build_remote(&config);
    if let Some(remote) = &remote {
        if !remote.probe().await {
            warn!("Redis not reachable yet, serving from local cache until it recovers");
        }
    }
    let monitor = remote.clone().map(|remote| {
        spawn_health_monitor(
            remote,
            Duration::from_secs(config.health_check_interval.max(1)),
        )
    });

    let cache = QueryCache::from_config(&config, remote);
    cache.start();

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Admin server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("admin server failed")?;

    if let Some(monitor) = monitor {
        monitor.abort();
        info!("Health monitor stopped");
    }
    cache.destroy();

    info!("Shutdown complete");
    Ok(())
}

/// Builds the primary tier, initially unavailable. The health monitor
/// opens it for traffic whenever Redis answers.
fn build_remote(config: &Config) -> Option<RemoteStore> {
    if !config.redis_enabled {
        info!("Redis disabled, using local cache only");
        return None;
    }

    let timeout = Duration::from_millis(config.redis_timeout_ms.max(1));
    match RedisBackend::new(config.redis_connection_info(), timeout) {
        Ok(backend) => Some(RemoteStore::with_timeout(Arc::new(backend), timeout)),
        Err(e) => {
            warn!(error = %e, "Invalid Redis configuration, using local cache only");
            None
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
