//! Persisted Model Artifact

use crate::boosting::{BoostingParams, GradientBoosting};
use crate::dataset::Dataset;
use crate::forest::{ForestParams, RandomForest};
use crate::metrics::RegressionMetrics;
use crate::tree::{DecisionTree, TreeParams};
use crate::{ModelError, Regressor};
use feature_encoder::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 2;

/// Supported regressor families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    /// Every supported family, in comparison order
    pub const ALL: [ModelKind; 3] = [
        ModelKind::DecisionTree,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "decision-tree",
            ModelKind::RandomForest => "random-forest",
            ModelKind::GradientBoosting => "gradient-boosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "decision-tree" | "tree" => Ok(ModelKind::DecisionTree),
            "random-forest" | "forest" | "rf" => Ok(ModelKind::RandomForest),
            "gradient-boosting" | "boosting" | "gbr" => Ok(ModelKind::GradientBoosting),
            other => Err(ModelError::InvalidParameter(format!("unknown model kind '{other}'"))),
        }
    }
}

/// A fitted regressor of any supported family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl TrainedModel {
    /// Fit a model of `kind` with default parameters and the given seed
    pub fn fit(kind: ModelKind, data: &Dataset, seed: u64) -> Result<Self, ModelError> {
        info!("Training {} on {} rows", kind, data.len());
        Ok(match kind {
            ModelKind::DecisionTree => {
                TrainedModel::DecisionTree(DecisionTree::fit(data, &TreeParams::default())?)
            }
            ModelKind::RandomForest => TrainedModel::RandomForest(RandomForest::fit(
                data,
                &ForestParams {
                    seed,
                    ..Default::default()
                },
            )?),
            ModelKind::GradientBoosting => TrainedModel::GradientBoosting(GradientBoosting::fit(
                data,
                &BoostingParams {
                    seed,
                    ..Default::default()
                },
            )?),
        })
    }

    /// Impurity-decrease importance per feature column, summing to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        match self {
            TrainedModel::DecisionTree(m) => m.feature_importances(),
            TrainedModel::RandomForest(m) => m.feature_importances(),
            TrainedModel::GradientBoosting(m) => m.feature_importances(),
        }
    }

    /// Family of the model
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }
}

impl Regressor for TrainedModel {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            TrainedModel::DecisionTree(m) => m.predict(features),
            TrainedModel::RandomForest(m) => m.predict(features),
            TrainedModel::GradientBoosting(m) => m.predict(features),
        }
    }
}

/// Everything needed to serve a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model: TrainedModel,
    /// Feature columns, in the order the model was trained on
    pub schema: Schema,
    /// Name of the predicted column
    pub target: String,
    /// Held-out evaluation at training time
    pub metrics: Option<RegressionMetrics>,
}

impl ModelArtifact {
    /// Bundle a trained model
    pub fn new(model: TrainedModel, schema: Schema, target: &str) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model,
            schema,
            target: target.to_string(),
            metrics: None,
        }
    }

    /// Attach evaluation results
    pub fn with_metrics(mut self, metrics: RegressionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The `top` most important schema columns, highest first
    pub fn ranked_features(&self, top: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.model.feature_importances())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top);
        ranked
    }

    /// Write the binary artifact
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let bytes = postcard::to_allocvec(self).map_err(|e| ModelError::Serialization(e.to_string()))?;
        std::fs::write(path, &bytes)?;
        info!("Saved {} model ({} bytes) to {}", self.model.kind(), bytes.len(), path.display());
        Ok(())
    }

    /// Read a binary artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        let artifact: ModelArtifact =
            postcard::from_bytes(&bytes).map_err(|e| ModelError::Serialization(e.to_string()))?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                expected: ARTIFACT_FORMAT_VERSION,
                actual: artifact.format_version,
            });
        }
        info!(
            "Loaded {} model from {} ({} features)",
            artifact.model.kind(),
            path.display(),
            artifact.schema.len()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec![10.0, 10.0, 50.0, 50.0],
        )
        .unwrap()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("random_forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("GBR".parse::<ModelKind>().unwrap(), ModelKind::GradientBoosting);
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_artifact_file_round_trip() {
        let model = TrainedModel::fit(ModelKind::DecisionTree, &tiny(), 42).unwrap();
        let metrics = RegressionMetrics::evaluate(&model, &tiny());
        let artifact = ModelArtifact::new(model, Schema::new(["temperature"]), "cnt").with_metrics(metrics);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded, artifact);
        assert_eq!(loaded.model.predict(&[2.5]), 50.0);
    }

    #[test]
    fn test_missing_artifact() {
        assert!(matches!(
            ModelArtifact::load("/nonexistent/model.bin"),
            Err(ModelError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(ModelArtifact::load(&path).is_err());
    }

    #[test]
    fn test_ranked_features() {
        // only the second column carries signal
        let data = Dataset::new(
            vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]],
            vec![10.0, 10.0, 50.0, 50.0],
        )
        .unwrap();
        let model = TrainedModel::fit(ModelKind::DecisionTree, &data, 42).unwrap();
        let artifact = ModelArtifact::new(model, Schema::new(["holiday", "temperature"]), "cnt");
        assert_eq!(artifact.ranked_features(1), vec![("temperature", 1.0)]);
        assert_eq!(artifact.ranked_features(5).len(), 2);
    }
}
