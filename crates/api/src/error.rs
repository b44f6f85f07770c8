//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use demand_model::{ModelError, PredictionStatus};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Request failures, rendered as `{"error": ...}` JSON
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request body
    #[error("{0}")]
    BadRequest(String),

    /// Prediction could not be produced
    #[error("{0}")]
    Prediction(String),
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        ApiError::Prediction(e.to_string())
    }
}

impl ApiError {
    /// Whether the error counts toward failed predictions
    pub fn is_prediction_failure(&self) -> bool {
        matches!(self, ApiError::Prediction(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_prediction_failure() {
            metrics::counter!("bike_demand_predictions_total", "status" => PredictionStatus::Failed.as_str())
                .increment(1);
        }
        match self {
            ApiError::BadRequest(message) => {
                warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Prediction(message) => {
                error!("Prediction failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message, "status": PredictionStatus::Failed })),
                )
                    .into_response()
            }
        }
    }
}
