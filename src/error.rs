//! Error taxonomy shared by the dashboard and the prediction API

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightsError {
    /// A dataset source could not be fetched or parsed. The dependent view
    /// is disabled; the rest of the process keeps running.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The model artifact failed to load at startup. Sticky for the process lifetime.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Scoring a single request failed.
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// A filter or transform produced zero rows.
    #[error("No data: {0}")]
    EmptyResult(String),
}

impl InsightsError {
    /// Build a `DataUnavailable` keeping the whole `anyhow` context chain.
    pub fn data_unavailable(err: &anyhow::Error) -> Self {
        InsightsError::DataUnavailable(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
