//! BioREx API Server
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use biorex_api::{create_router, state::AppState};
use biorex_core::config::AppConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().context("failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "biorex_api={level},biorex_session={level},biorex_extractor={level},tower_http=debug",
            level = config.logging.level
        )
        .into()
    });
    if config.logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let gateway = biorex_extractor::create_gateway(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config, gateway));
    let app = create_router(Arc::clone(&state));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("BioREx API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            state.set_ready(false);
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}
