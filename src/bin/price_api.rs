//! Car rental price prediction API
//!
//! `GET /`, `GET /health`, `GET /preview?rows=N`, `POST /predict`.

use getaround_insights::{server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    log::info!(
        "Model: {}, pricing data: {}",
        config.model_path.display(),
        config.pricing_source
    );

    server::run_server(config).await
}
