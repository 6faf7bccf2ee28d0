//! Offline Worker - HTTP gateway
//!
//! Serves the clinic app through the worker: page requests are answered from
//! the cache partitions or the upstream, and platform events arrive on the
//! `/__sw` control API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_worker::tasks::spawn_idle_client_sweep;
use offline_worker::{create_router, AppState, Config, HttpFetcher, ServiceWorker};

/// Main entry point for the offline worker gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the worker around an HTTP fetcher for the upstream
/// 4. Install and activate (pre-caching the manifest)
/// 5. Start the idle client sweep
/// 6. Serve the router until SIGINT/SIGTERM, then stop background tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_worker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offline worker");

    let config = Config::from_env();
    info!(
        "Configuration loaded: app={}, role={}, version={}, origin={}, upstream={}, port={}, fetch_timeout={}ms, client_idle={}s",
        config.app_name,
        config.role,
        config.version,
        config.origin,
        config.upstream,
        config.server_port,
        config.fetch_timeout_ms,
        config.client_idle_secs
    );

    let fetcher = HttpFetcher::new(config.upstream.clone(), config.fetch_timeout())
        .context("failed to build upstream HTTP client")?;
    let port = config.server_port;
    let client_idle = config.client_idle_timeout();
    let worker = ServiceWorker::new(config, Arc::new(fetcher));

    let (installed, activated) = worker.start().await.context("worker failed to start")?;
    info!(
        "Worker active: {} assets cached, {} failed, {} old partitions deleted",
        installed.cached.len(),
        installed.failed.len(),
        activated.deleted.len()
    );

    let state = AppState::new(worker.clone());
    let sweep_handle = spawn_idle_client_sweep(state.clone(), client_idle);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweep_handle.abort();
    worker.shutdown().await;
    warn!("Background tasks aborted");
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
}
