//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::data::model::{Row, Table};
use crate::predict::PricingFeatures;

use super::error::{ApiError, Result};
use super::state::AppState;

pub const DEFAULT_PREVIEW_ROWS: i64 = 10;

// ============================================================================
// Info Handlers
// ============================================================================

/// Root endpoint with API information
pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Car Rental Price Prediction API!",
        "status": "running",
        "model_loaded": state.gateway.is_available(),
        "endpoints": {
            "preview": "/preview?rows=10",
            "predict": "/predict",
            "health": "/health",
        },
        "version": crate::VERSION,
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model_loaded": state.gateway.is_available(),
        "model": state.gateway.describe(),
        "dataset_loaded": state.dataset_loaded(),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": state.uptime_secs(),
    }))
}

// ============================================================================
// Preview Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    rows: Option<i64>,
}

/// Random sample of the pricing dataset, `rows` distinct records (default 10).
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Vec<Row>>> {
    let requested = query.rows.unwrap_or(DEFAULT_PREVIEW_ROWS);
    if requested <= 0 {
        return Err(ApiError::BadRequest(format!(
            "rows must be a positive integer, got {requested}"
        )));
    }

    let table = state.pricing_table().await?;
    let limit = (requested as usize).min(state.config.preview_max_rows);
    let sample = sample_rows(&table, limit);
    log::info!("preview: {} of {} rows (requested {requested})", sample.len(), table.len());

    Ok(Json(sample))
}

/// Up to `n` distinct rows drawn without replacement.
pub fn sample_rows(table: &Table, n: usize) -> Vec<Row> {
    let amount = n.min(table.len());
    let mut rng = rand::thread_rng();
    index::sample(&mut rng, table.len(), amount)
        .into_iter()
        .map(|i| table.rows[i].clone())
        .collect()
}

// ============================================================================
// Machine Learning Handlers
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
}

/// Rental price per day for one vehicle.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(features): Json<PricingFeatures>,
) -> Result<Json<PredictionResponse>> {
    let prediction = state.gateway.predict(&features)?;
    log::info!(
        "predict: {} {} {}hp {}km -> {prediction:.2}",
        features.model_key,
        features.fuel,
        features.engine_power,
        features.mileage
    );
    Ok(Json(PredictionResponse { prediction }))
}
