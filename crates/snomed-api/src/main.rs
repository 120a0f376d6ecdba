//! SNOMED API Server
//!
//! Backend proxy holding the Gemini credential for client applications.
//!
//! Author: hephaex@gmail.com

use snomed_api::{create_router, state::AppState};
use snomed_core::config::{AppConfig, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("snomed_api={0},snomed_extractor={0},tower_http=debug", logging.level).into()
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may come from a local .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config_path = std::env::var("SNOMED_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path)?;

    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config));
    if !state.is_ready() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/v1/extract will fail until configured");
    }

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("SNOMED API Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
