//! Webhook configuration.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

/// Webhook configuration (env-driven).
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address.
    pub listen_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// JSON host list backing the inventory.
    pub inventory_file: PathBuf,

    /// Upper bound on each inventory query.
    pub inventory_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("BMSET_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:9443".to_string())
            .parse()
            .context("BMSET_LISTEN_ADDR must be a socket address (host:port).")?;

        let log_level = std::env::var("BMSET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let inventory_file = std::env::var("BMSET_INVENTORY_FILE")
            .map(PathBuf::from)
            .context("Missing inventory. Set BMSET_INVENTORY_FILE to a JSON host list.")?;

        let timeout_ms: u64 = std::env::var("BMSET_INVENTORY_TIMEOUT_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("BMSET_INVENTORY_TIMEOUT_MS must be an integer (milliseconds).")?
            .unwrap_or(5000);
        let inventory_timeout = Duration::from_millis(timeout_ms.max(100));

        Ok(Self {
            listen_addr,
            log_level,
            inventory_file,
            inventory_timeout,
        })
    }
}
