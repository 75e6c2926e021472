//! API route definitions

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{handlers, state::AppState};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Visit / for the list of endpoints.",
        })),
    )
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Preview
        .route("/preview", get(handlers::preview))
        // Machine Learning
        .route("/predict", post(handlers::predict))
        .fallback(handle_404)
        .with_state(state)
}
