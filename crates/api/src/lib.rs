//! Bike Demand API Server
//!
//! REST prediction service in front of a trained demand model.

use axum::{
    routing::{get, post},
    Router,
};
use demand_model::PredictionEngine;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
mod error;
mod routes;

pub use config::ServerConfig;
pub use error::ApiError;

/// Application state shared across handlers, built once at startup
pub struct AppState {
    /// Model, schema and scaler
    pub engine: PredictionEngine,
    /// Effective configuration
    pub config: ServerConfig,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus render handle, if a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(engine: PredictionEngine, config: ServerConfig) -> Self {
        Self {
            engine,
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Load the engine described by `config`.
    ///
    /// Fails when the model is missing (unless `allow_mock`) or when a
    /// configured schema or scaler cannot be read.
    pub fn load(config: ServerConfig) -> anyhow::Result<Self> {
        let engine = PredictionEngine::load(
            &config.model_path,
            config.schema_path.as_deref(),
            config.scaler_path.as_deref(),
            config.allow_mock,
        )?;
        if engine.is_loaded() {
            info!("Model loaded ({} input columns)", engine.schema().len());
        } else {
            warn!("Serving mock predictions");
        }
        Ok(Self::new(engine, config))
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = state.config.cors;
    let router = Router::new()
        .route("/", get(routes::info::index))
        .route("/health", get(routes::info::health))
        .route("/schema", get(routes::info::schema))
        .route("/metrics", get(routes::info::metrics))
        .route("/predict", post(routes::predict::predict_features))
        .route("/predict/record", post(routes::predict::predict_record))
        .route("/predict/form", post(routes::predict::predict_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Initialize logging; `RUST_LOG` takes precedence over `default_level`
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Run the server until the listener fails
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let enable_metrics = config.enable_metrics;

    let mut state = AppState::load(config)?;
    if enable_metrics {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => state = state.with_metrics(handle),
            Err(e) => warn!("Metrics recorder not installed: {}", e),
        }
    }
    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
