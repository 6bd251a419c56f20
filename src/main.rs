//! Response Cache - news API server with a cache-aside response layer
//!
//! Serves the news endpoints through Redis-backed response caching and keeps
//! serving, uncached, when Redis is unreachable.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use response_cache::api::{create_router, AppState};
use response_cache::cache::{ConnectionManager, MemoryStore, RetryPolicy};
use response_cache::config::{Backend, Config};
use response_cache::{spawn_cleanup_task, spawn_reconnect_task};

/// Main entry point for the server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to the cache store (bounded retries, never fatal)
/// 4. Start background reconnect / cleanup tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "response_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting response cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, compression_threshold={}B, default_ttl={}s, port={}",
        config.backend, config.compression_threshold, config.default_ttl, config.server_port
    );

    let mut background: Vec<JoinHandle<()>> = Vec::new();

    let manager = match config.backend {
        Backend::Redis => ConnectionManager::connect_redis(&config).await,
        Backend::Memory => {
            let store = Arc::new(MemoryStore::new());
            background.push(spawn_cleanup_task(store.clone(), 1));
            let policy = RetryPolicy::with_max_retries(config.max_retries);
            ConnectionManager::initialize(store, &policy, config.operation_timeout()).await
        }
    };
    let manager = Arc::new(manager);
    info!("Cache connection state: {:?}", manager.state());

    background.extend(spawn_reconnect_task(manager.clone(), config.reconnect_interval));

    let app = create_router(AppState::from_config(manager, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(background))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts background tasks.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
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

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
