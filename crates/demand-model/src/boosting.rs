//! Gradient Boosted Trees (squared loss)

use crate::dataset::Dataset;
use crate::tree::{mean_importances, DecisionTree, TreeParams};
use crate::{ModelError, Regressor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Boosting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to each stage
    pub learning_rate: f64,
    /// Per-stage tree limits
    pub tree: TreeParams,
    /// Fraction of rows used per stage
    pub subsample: f64,
    /// RNG seed
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            tree: TreeParams {
                max_depth: Some(3),
                ..Default::default()
            },
            subsample: 1.0,
            seed: 42,
        }
    }
}

/// Additive model: `init + lr * Σ tree_m(x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoosting {
    /// Fit stages on residuals of the running prediction
    pub fn fit(data: &Dataset, params: &BoostingParams) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        if !(params.learning_rate > 0.0) {
            return Err(ModelError::InvalidParameter("learning_rate must be > 0".to_string()));
        }
        if !(params.subsample > 0.0 && params.subsample <= 1.0) {
            return Err(ModelError::InvalidParameter("subsample must be in (0, 1]".to_string()));
        }

        let n = data.len();
        let init = data.targets.iter().sum::<f64>() / n as f64;
        let mut current = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let per_stage = ((n as f64 * params.subsample).round() as usize).clamp(1, n);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            for ((r, y), f) in residuals.iter_mut().zip(&data.targets).zip(&current) {
                *r = y - f;
            }
            let mut rows: Vec<usize> = (0..n).collect();
            if per_stage < n {
                rows.shuffle(&mut rng);
                rows.truncate(per_stage);
            }
            let tree = DecisionTree::fit_rows(&data.features, &residuals, &mut rows, &params.tree, &mut rng);
            for (f, row) in current.iter_mut().zip(&data.features) {
                *f += params.learning_rate * tree.predict(row);
            }
            if stage % 25 == 0 {
                let mse = data
                    .targets
                    .iter()
                    .zip(&current)
                    .map(|(y, f)| (y - f).powi(2))
                    .sum::<f64>()
                    / n as f64;
                debug!("Boosting stage {}: training MSE {:.4}", stage, mse);
            }
            trees.push(tree);
        }

        info!("Fitted gradient boosting with {} stages on {} rows", trees.len(), n);
        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    /// Number of stages
    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-stage importances, renormalized to sum to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        mean_importances(&self.trees)
    }
}

impl Regressor for GradientBoosting {
    fn predict(&self, features: &[f64]) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RegressionMetrics;

    fn linear_data() -> Dataset {
        let features: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64]).collect();
        let targets = (0..50).map(|i| 3.0 * i as f64 + 10.0).collect();
        Dataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_boosting_reduces_error() {
        let data = linear_data();
        let zero_stages = GradientBoosting::fit(
            &data,
            &BoostingParams {
                n_estimators: 0,
                ..Default::default()
            },
        )
        .unwrap();
        let boosted = GradientBoosting::fit(&data, &BoostingParams::default()).unwrap();

        let baseline = RegressionMetrics::evaluate(&zero_stages, &data);
        let fitted = RegressionMetrics::evaluate(&boosted, &data);
        assert!(fitted.mse < baseline.mse / 10.0);
        assert!(fitted.r2 > 0.95);
    }

    #[test]
    fn test_init_is_mean() {
        let data = linear_data();
        let model = GradientBoosting::fit(
            &data,
            &BoostingParams {
                n_estimators: 0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!((model.predict(&[0.0]) - 83.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let params = BoostingParams {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(GradientBoosting::fit(&linear_data(), &params).is_err());
    }

    #[test]
    fn test_importance_on_single_feature() {
        let model = GradientBoosting::fit(&linear_data(), &BoostingParams::default()).unwrap();
        assert_eq!(model.feature_importances(), vec![1.0]);
    }
}
