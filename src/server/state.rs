//! Application state shared across handlers

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::data::cache::DatasetCache;
use crate::data::loader::DataSource;
use crate::data::model::Table;
use crate::error::{InsightsError, Result};
use crate::predict::PredictionGateway;

/// Read-only after startup: the model, the dataset cache and the settings.
pub struct AppState {
    pub config: AppConfig,
    pub gateway: PredictionGateway,
    pub datasets: DatasetCache,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: PredictionGateway, datasets: DatasetCache) -> Self {
        Self {
            config,
            gateway,
            datasets,
            started_at: Utc::now(),
        }
    }

    pub fn pricing_source(&self) -> DataSource {
        self.config.pricing_data_source()
    }

    /// Pricing table, loading it on a blocking thread the first time.
    pub async fn pricing_table(self: &Arc<Self>) -> Result<Arc<Table>> {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.datasets.get(&state.pricing_source()))
            .await
            .map_err(|e| InsightsError::DataUnavailable(format!("dataset loader panicked: {e}")))?
    }

    pub fn dataset_loaded(&self) -> bool {
        let source = self.pricing_source();
        self.datasets.is_loaded(&source) && self.datasets.get(&source).is_ok()
    }

    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}
