use anyhow::Result;
use std::sync::Arc;

use csv_analysis_service::{
    config, logging, services::analysis_store::AnalysisStore, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    let store = if config.in_memory_database() {
        tracing::warn!("Using in-memory database; analyses will not survive a restart");
        AnalysisStore::open_in_memory()?
    } else {
        AnalysisStore::open(&config.database_path)?
    };

    let addr = config.socket_addr();
    let state = Arc::new(AppState::new(config, Arc::new(store)));
    let app = csv_analysis_service::app(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
