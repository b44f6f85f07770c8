//! Prediction Engine

use crate::artifact::{ModelArtifact, ModelKind, TrainedModel};
use crate::{ModelError, Regressor};
use data_cleaner::FeatureScaler;
use feature_encoder::{encode_record, FeatureVector, RawRecord, Schema};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// How a prediction was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    /// Real model output
    Success,
    /// No model loaded; random placeholder value
    Mock,
    /// Prediction could not be produced
    Failed,
}

impl PredictionStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Success => "success",
            PredictionStatus::Mock => "mock",
            PredictionStatus::Failed => "failed",
        }
    }
}

/// A single demand prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted rental count
    pub value: f64,
    pub status: PredictionStatus,
}

/// Immutable inference handle, built once at startup
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    model: Option<TrainedModel>,
    schema: Schema,
    scaler: Option<FeatureScaler>,
}

impl PredictionEngine {
    /// Create an engine around a trained model
    pub fn new(model: TrainedModel, schema: Schema, scaler: Option<FeatureScaler>) -> Self {
        Self {
            model: Some(model),
            schema,
            scaler,
        }
    }

    /// Create an engine from a loaded artifact, using its schema
    pub fn from_artifact(artifact: ModelArtifact, scaler: Option<FeatureScaler>) -> Self {
        Self::new(artifact.model, artifact.schema, scaler)
    }

    /// Create a mock engine that answers with random values
    pub fn mock(schema: Schema) -> Self {
        info!("Creating mock prediction engine");
        Self {
            model: None,
            schema,
            scaler: None,
        }
    }

    /// Load model, schema and scaler from disk.
    ///
    /// A missing model halts with [`ModelError::ArtifactMissing`] unless
    /// `allow_mock` is set, in which case the engine falls back to mock
    /// predictions. A configured but missing schema or scaler file is always
    /// an error.
    pub fn load(
        model_path: &Path,
        schema_path: Option<&Path>,
        scaler_path: Option<&Path>,
        allow_mock: bool,
    ) -> Result<Self, ModelError> {
        let artifact = match ModelArtifact::load(model_path) {
            Ok(artifact) => Some(artifact),
            Err(ModelError::ArtifactMissing(path)) if allow_mock => {
                warn!("Model file not found at {}. Using mock predictions.", path);
                None
            }
            Err(e) => return Err(e),
        };

        let schema = match (schema_path, &artifact) {
            (Some(path), _) => Schema::load(path)?,
            (None, Some(artifact)) => artifact.schema.clone(),
            (None, None) => Schema::default(),
        };
        if let Some(artifact) = &artifact {
            if artifact.schema != schema {
                warn!(
                    "Schema file differs from the schema the model was trained on ({} vs {} columns)",
                    schema.len(),
                    artifact.schema.len()
                );
            }
        }

        let scaler = scaler_path.map(FeatureScaler::load).transpose()?;

        Ok(Self {
            model: artifact.map(|a| a.model),
            schema,
            scaler,
        })
    }

    /// Whether a real model is loaded
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Family of the loaded model
    pub fn model_kind(&self) -> Option<ModelKind> {
        self.model.as_ref().map(TrainedModel::kind)
    }

    /// Input schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether a scaler is applied to encoded records
    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Encode a record into model input, applying the scaler if present
    pub fn encode(&self, record: &RawRecord) -> FeatureVector {
        let mut vector = encode_record(record, &self.schema);
        if let Some(scaler) = &self.scaler {
            scaler.apply(&self.schema, &mut vector.values);
        }
        vector
    }

    /// Predict from a model-ready feature vector.
    ///
    /// The vector length is not checked against the schema; a mismatch is
    /// logged and prediction proceeds.
    pub fn predict_features(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        if !self.schema.is_empty() && features.len() != self.schema.len() {
            warn!(
                "Feature vector has {} values but schema has {} columns",
                features.len(),
                self.schema.len()
            );
        }

        let Some(model) = &self.model else {
            let value = rand::thread_rng().gen_range(50..500) as f64;
            debug!("Mock prediction: {}", value);
            return Ok(Prediction {
                value,
                status: PredictionStatus::Mock,
            });
        };

        let value = model.predict(features);
        if !value.is_finite() {
            return Err(ModelError::InferenceFailed(format!("model returned {value}")));
        }
        debug!("Predicted {:.2} from {} features", value, features.len());
        Ok(Prediction {
            value,
            status: PredictionStatus::Success,
        })
    }

    /// Encode a raw record and predict
    pub fn predict_record(&self, record: &RawRecord) -> Result<Prediction, ModelError> {
        let vector = self.encode(record);
        self.predict_features(vector.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::tree::{DecisionTree, TreeParams};
    use data_cleaner::ScalerKind;

    fn temperature_engine(scaler: Option<FeatureScaler>) -> PredictionEngine {
        // warmer means more rentals
        let data = Dataset::new(
            vec![vec![0.0, 1.0], vec![0.2, 1.0], vec![0.8, 1.0], vec![1.0, 1.0]],
            vec![20.0, 20.0, 300.0, 300.0],
        )
        .unwrap();
        let tree = DecisionTree::fit(&data, &TreeParams::default()).unwrap();
        PredictionEngine::new(
            TrainedModel::DecisionTree(tree),
            Schema::new(["temperature", "working-day"]),
            scaler,
        )
    }

    #[test]
    fn test_predict_record() {
        let engine = temperature_engine(None);
        let record = RawRecord::new().with("temp", 0.9).with("workingday", true);
        let prediction = engine.predict_record(&record).unwrap();
        assert_eq!(prediction.status, PredictionStatus::Success);
        assert_eq!(prediction.value, 300.0);
    }

    #[test]
    fn test_scaler_applied_before_prediction() {
        // raw temperatures in [0, 40] scaled down to [0, 1]
        let scaler = FeatureScaler::fit(ScalerKind::MinMax, &[("temperature", vec![0.0, 40.0])]);
        let engine = temperature_engine(Some(scaler));
        let record = RawRecord::new().with("temperature", 36.0);
        assert_eq!(engine.encode(&record).values, vec![0.9, 0.0]);
        assert_eq!(engine.predict_record(&record).unwrap().value, 300.0);
    }

    #[test]
    fn test_mismatched_length_still_predicts() {
        let engine = temperature_engine(None);
        let prediction = engine.predict_features(&[0.1]).unwrap();
        assert_eq!(prediction.value, 20.0);
    }

    #[test]
    fn test_mock_range() {
        let engine = PredictionEngine::mock(Schema::default());
        assert!(!engine.is_loaded());
        for _ in 0..20 {
            let p = engine.predict_features(&[1.0, 2.0]).unwrap();
            assert_eq!(p.status, PredictionStatus::Mock);
            assert!((50.0..500.0).contains(&p.value));
        }
    }

    #[test]
    fn test_load_missing_model() {
        let missing = Path::new("/nonexistent/model.bin");
        assert!(matches!(
            PredictionEngine::load(missing, None, None, false),
            Err(ModelError::ArtifactMissing(_))
        ));
        let engine = PredictionEngine::load(missing, None, None, true).unwrap();
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_load_missing_scaler_halts() {
        let missing = Path::new("/nonexistent/scaler.json");
        let result = PredictionEngine::load(Path::new("/nonexistent/model.bin"), None, Some(missing), true);
        assert!(matches!(result, Err(ModelError::Data(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.bin");
        let engine = temperature_engine(None);
        let artifact = ModelArtifact::new(
            engine.model.clone().unwrap(),
            engine.schema().clone(),
            "cnt",
        );
        artifact.save(&model_path).unwrap();

        let loaded = PredictionEngine::load(&model_path, None, None, false).unwrap();
        assert_eq!(loaded.model_kind(), Some(ModelKind::DecisionTree));
        assert_eq!(loaded.schema().len(), 2);
    }
}
