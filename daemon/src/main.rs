//! Sensord daemon binary
//!
//! Home sensor collection endpoint over plain TCP.

#![allow(unused_crate_dependencies)]

use sensord::Daemon;
use sensord_core::config::ServerConfig;
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() -> sensord::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting sensord");

    // Config path: first argument, else SENSORD_CONFIG, else defaults
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SENSORD_CONFIG").ok())
        .map(PathBuf::from);
    let config = ServerConfig::load_or_default(config_path.as_deref())
        .map_err(sensord::DaemonError::Core)?;

    let daemon = Daemon::new(config);

    // Handle graceful shutdown
    let daemon_clone = daemon.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C, shutting down...");
        daemon_clone.stop();
    });

    if let Err(e) = daemon.start().await {
        error!("Daemon failed: {}", e);
        return Err(e);
    }

    info!("Daemon stopped");
    Ok(())
}
