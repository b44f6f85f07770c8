//! Service Info Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for `/`
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: String,
    pub endpoints: Vec<&'static str>,
}

/// Response for `/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_kind: Option<String>,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Response for `/schema`
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub columns: Vec<String>,
    pub count: usize,
    pub scaled: bool,
}

/// Service info and endpoint list
pub async fn index(State(state): State<Arc<AppState>>) -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "Bike Demand Prediction API",
        version: state.version.clone(),
        endpoints: vec![
            "GET /",
            "GET /health",
            "GET /schema",
            "GET /metrics",
            "POST /predict",
            "POST /predict/record",
            "POST /predict/form",
        ],
    })
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.engine.is_loaded(),
        model_kind: state.engine.model_kind().map(|k| k.to_string()),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Input columns the model expects
pub async fn schema(State(state): State<Arc<AppState>>) -> Json<SchemaResponse> {
    let columns = state.engine.schema().columns().to_vec();
    Json(SchemaResponse {
        count: columns.len(),
        columns,
        scaled: state.engine.has_scaler(),
    })
}

/// Prometheus exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
