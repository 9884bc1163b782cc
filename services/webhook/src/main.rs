//! bmset admission webhook
//!
//! Answers admission reviews for bare-metal sets: every create and update is
//! checked against the host inventory before the API server persists it.

use std::sync::Arc;

use anyhow::Result;
use bmset_admission::{TracingSink, Validator, ValidatorConfig};
use bmset_webhook::{api, config, inventory::FileInventory, state::AppState};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to BMSET_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting bmset admission webhook");
    info!(
        listen_addr = %config.listen_addr,
        inventory_file = %config.inventory_file.display(),
        inventory_timeout_ms = config.inventory_timeout.as_millis() as u64,
        "Configuration loaded"
    );

    let inventory = Arc::new(FileInventory::new(&config.inventory_file));
    let validator = Validator::new(
        inventory,
        Arc::new(TracingSink),
        ValidatorConfig {
            inventory_timeout: config.inventory_timeout,
        },
    );

    // An unreadable inventory is not fatal; readyz reports it until it recovers.
    if let Err(e) = validator.inventory().health_check().await {
        warn!(error = %e, "Inventory not readable at startup");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState::new(validator);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
            return Ok(());
        }
    }

    let _ = shutdown_tx.send(true);

    let shutdown_timeout = std::time::Duration::from_secs(10);
    if tokio::time::timeout(shutdown_timeout, server_handle).await.is_err() {
        warn!("HTTP server did not shut down in time");
    }

    info!("Webhook shutdown complete");
    Ok(())
}
