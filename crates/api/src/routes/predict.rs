//! Prediction Routes

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Form, State,
    },
    Json,
};
use demand_model::{Prediction, PredictionStatus};
use feature_encoder::{FieldValue, RawRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};

/// Response for every prediction endpoint
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub status: PredictionStatus,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        metrics::counter!("bike_demand_predictions_total", "status" => p.status.as_str()).increment(1);
        Self {
            prediction: p.value,
            status: p.status,
        }
    }
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

/// Model-ready feature vector, `{"features": [...]}`
pub async fn predict_features(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let body = json_body(body)?;
    let features = body
        .get("features")
        .ok_or_else(|| ApiError::BadRequest("Missing \"features\" in request".to_string()))?;

    let values = features
        .as_array()
        .ok_or_else(|| ApiError::Prediction("\"features\" must be an array".to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ApiError::Prediction(format!("could not convert {v} to float")))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    debug!("Predicting from {} raw features", values.len());
    let prediction = state.engine.predict_features(&values)?;
    Ok(Json(prediction.into()))
}

/// Raw record as a JSON object; `null` fields read as missing
pub async fn predict_record(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(record) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid record: {}", e.body_text())))?;

    debug!("Predicting from record with {} fields", record.len());
    let prediction = state.engine.predict_record(&record)?;
    Ok(Json(prediction.into()))
}

/// Raw record as urlencoded form fields
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Form(fields) =
        form.map_err(|e| ApiError::BadRequest(format!("Invalid form body: {}", e.body_text())))?;
    let record: RawRecord = fields
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k, FieldValue::Text(v)))
        .collect();

    debug!("Predicting from form with {} fields", record.len());
    let prediction = state.engine.predict_record(&record)?;
    Ok(Json(prediction.into()))
}
