//! Price prediction server
//!
//! Serves the pre-trained pricing model over HTTP together with a random
//! preview of the pricing dataset.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ApiError;
pub use handlers::{sample_rows, PredictionResponse, DEFAULT_PREVIEW_ROWS};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::cache::DatasetCache;
use crate::predict::PredictionGateway;

/// Load the model, warm the pricing dataset and serve until ctrl+c.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let gateway = PredictionGateway::load(&config.model_path);
    let datasets = DatasetCache::new(config.fetch_timeout);
    let state = Arc::new(AppState::new(config.clone(), gateway, datasets));

    // A broken dataset only disables /preview.
    if let Err(e) = state.pricing_table().await {
        log::warn!("{e}; /preview will answer 503");
    }

    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    log::info!(
        "Price API listening on http://{addr} (model loaded: {})",
        state.gateway.is_available()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let started_at = state.started_at;
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install CTRL+C signal handler: {e}");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(started_at);
        log::info!(
            "Shutdown signal received after {}s, stopping server gracefully",
            uptime.num_seconds()
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    log::info!("Server shut down cleanly");
    Ok(())
}
