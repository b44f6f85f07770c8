//! Bike Demand Prediction Server - Main Entry Point

use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    init_logging(&config.log_level);

    info!("=== Bike Demand API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}", config.summary());

    run_server(config).await
}
