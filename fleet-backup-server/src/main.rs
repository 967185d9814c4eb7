mod config;
mod error;
mod routes;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;
use fleet_backup::db::connection::close_pool;
use fleet_backup::{blob, db, BackupContext};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.backup.log.level.as_str().into()),
        )
        .init();

    tracing::info!("Starting backup server on port {}", config.port);

    // Open the live store and object storage
    let records = Arc::new(db::open(&config.backup.database)?);
    let blobs = blob::from_config(&config.backup.storage)?;
    tracing::info!(
        backend = ?config.backup.storage.backend,
        collections = ?config.backup.backup.collections,
        "Backup context ready"
    );

    let ctx = BackupContext::new(
        records.clone(),
        blobs,
        config.backup.backup.collections.clone(),
        config.backup.backup.staging_dir.clone(),
    )?;
    let state = Arc::new(AppState::new(ctx));

    // Build router
    let app = routes::create_router(state);

    // Start HTTP server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    // Graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close database
    tracing::info!("Shutting down...");
    close_pool(records.pool());
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
