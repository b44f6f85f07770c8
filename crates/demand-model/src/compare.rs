//! Model Comparison

use crate::artifact::{ModelKind, TrainedModel};
use crate::dataset::Dataset;
use crate::metrics::RegressionMetrics;
use crate::split::train_test_split;
use crate::ModelError;
use serde::Serialize;
use tracing::info;

/// Held-out scores of one model family
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelComparison {
    pub kind: ModelKind,
    pub metrics: RegressionMetrics,
}

/// Fit every model family on one shared split and score each on the
/// held-out rows
pub fn compare_models(
    data: &Dataset,
    test_size: f64,
    seed: u64,
) -> Result<Vec<ModelComparison>, ModelError> {
    let (train, test) = train_test_split(data, test_size, seed)?;
    ModelKind::ALL
        .iter()
        .map(|&kind| {
            let model = TrainedModel::fit(kind, &train, seed)?;
            let metrics = RegressionMetrics::evaluate(&model, &test);
            info!("{}: MAE {:.4}, RMSE {:.4}, R2 {:.4}", kind, metrics.mae, metrics.rmse, metrics.r2);
            Ok(ModelComparison { kind, metrics })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_scored_on_same_rows() {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 24) as f64, (i % 7) as f64]).collect();
        let targets = features.iter().map(|r| if r[0] >= 7.0 && r[0] <= 9.0 { 400.0 } else { 60.0 }).collect();
        let data = Dataset::new(features, targets).unwrap();

        let results = compare_models(&data, 0.2, 42).unwrap();
        let kinds: Vec<ModelKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, ModelKind::ALL.to_vec());
        assert!(results.iter().all(|r| r.metrics.samples == 8));
    }

    #[test]
    fn test_invalid_split_propagates() {
        let data = Dataset::new(vec![vec![1.0]], vec![1.0]).unwrap();
        assert!(compare_models(&data, 0.2, 42).is_err());
    }
}
