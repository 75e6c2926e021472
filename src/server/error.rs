//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::InsightsError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Insights(#[from] InsightsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Insights(InsightsError::ModelUnavailable(_))
            | ApiError::Insights(InsightsError::DataUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Insights(InsightsError::PredictionFailed(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Insights(InsightsError::EmptyResult(_)) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(msg) => {
                log::error!("Internal server error: {msg}");
                "An internal error occurred".to_string()
            }
            ApiError::Insights(e @ InsightsError::PredictionFailed(_)) => {
                log::warn!("{e}");
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (InsightsError::ModelUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (InsightsError::DataUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (InsightsError::PredictionFailed("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::BadRequest("rows".into()).status(), StatusCode::BAD_REQUEST);
    }
}
