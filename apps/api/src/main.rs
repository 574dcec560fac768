//! # Rx Dictionary API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup:  .env ─► ApiConfig ─► Database::new (connect + migrate)      │
//! │  serve:    axum on RXDICT_BIND_ADDR:RXDICT_HTTP_PORT                   │
//! │  shutdown: Ctrl+C / SIGTERM ─► drain requests ─► Database::close       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rxdict_api::config::ApiConfig;
use rxdict_api::{router, AppState};
use rxdict_core::NormalizeRules;
use rxdict_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Rx Dictionary API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        db_path = %config.database_path.display(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.max_connections)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms)),
    )
    .await
    .context("opening database")?;
    info!("Database ready");

    let state = AppState::new(
        Arc::new(db.drugs()),
        NormalizeRules::new(config.max_field_length),
    );
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
