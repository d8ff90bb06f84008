/// Tradeflow: visual editor core for trading-automation workflows
///
/// Main entry point for the reference workflow service the editor talks to.

use tradeflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow management API at /api/workflows/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3004 and data/tradeflow.db)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
