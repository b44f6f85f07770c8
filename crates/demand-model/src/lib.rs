//! Demand Model
//!
//! Regression trees and ensembles for bike-sharing demand, evaluation metrics,
//! the persisted model artifact, and the prediction engine used by the server.

mod artifact;
mod boosting;
mod compare;
mod dataset;
mod engine;
mod forest;
mod metrics;
mod split;
mod tree;

pub use artifact::{ModelArtifact, ModelKind, TrainedModel, ARTIFACT_FORMAT_VERSION};
pub use boosting::{BoostingParams, GradientBoosting};
pub use compare::{compare_models, ModelComparison};
pub use dataset::Dataset;
pub use engine::{Prediction, PredictionEngine, PredictionStatus};
pub use forest::{ForestParams, RandomForest};
pub use metrics::RegressionMetrics;
pub use split::train_test_split;
pub use tree::{DecisionTree, TreeParams};

use thiserror::Error;

/// Anything that maps a feature vector to a demand estimate.
///
/// Features past the end of the vector read as 0; the vector length is not
/// checked against the training schema.
pub trait Regressor {
    fn predict(&self, features: &[f64]) -> f64;

    /// Predict every row
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

/// Errors from training, persistence or inference
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    ArtifactMissing(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Unsupported artifact format: expected {expected}, got {actual}")]
    UnsupportedFormat { expected: u32, actual: u32 },
    #[error("Schema error: {0}")]
    Schema(#[from] feature_encoder::SchemaError),
    #[error("Data error: {0}")]
    Data(#[from] data_cleaner::CleanError),
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Invalid input shape: expected {expected} rows, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
