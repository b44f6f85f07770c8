//! Random Forest Regressor

use crate::dataset::Dataset;
use crate::tree::{mean_importances, DecisionTree, TreeParams};
use crate::{ModelError, Regressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Forest configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Per-tree growth limits
    pub tree: TreeParams,
    /// Draw each tree's rows with replacement
    pub bootstrap: bool,
    /// RNG seed
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Bagged ensemble of regression trees; predicts the mean of its trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit the forest
    pub fn fit(data: &Dataset, params: &ForestParams) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidParameter("n_estimators must be > 0".to_string()));
        }

        let n = data.len();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for t in 0..params.n_estimators {
            let mut rows: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let tree = DecisionTree::fit_rows(&data.features, &data.targets, &mut rows, &params.tree, &mut rng);
            debug!("Tree {}: {} nodes", t, tree.node_count());
            trees.push(tree);
        }

        info!("Fitted random forest with {} trees on {} rows", trees.len(), n);
        Ok(Self { trees })
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree importances, renormalized to sum to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        mean_importances(&self.trees)
    }
}

impl Regressor for RandomForest {
    fn predict(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(features)).sum::<f64>() / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_data() -> Dataset {
        // rush hour around feature 0 in [0.3, 0.4]
        let features: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64 / 100.0, (i % 7) as f64]).collect();
        let targets = features
            .iter()
            .map(|r| if (0.3..0.4).contains(&r[0]) { 500.0 } else { 50.0 })
            .collect();
        Dataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_forest_learns_peak() {
        let params = ForestParams {
            n_estimators: 20,
            ..Default::default()
        };
        let forest = RandomForest::fit(&hourly_data(), &params).unwrap();
        assert_eq!(forest.n_trees(), 20);
        assert!(forest.predict(&[0.35, 2.0]) > 300.0);
        assert!(forest.predict(&[0.8, 2.0]) < 150.0);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let params = ForestParams {
            n_estimators: 5,
            ..Default::default()
        };
        let a = RandomForest::fit(&hourly_data(), &params).unwrap();
        let b = RandomForest::fit(&hourly_data(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let params = ForestParams {
            n_estimators: 0,
            ..Default::default()
        };
        assert!(matches!(
            RandomForest::fit(&hourly_data(), &params),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_importance_favours_peak_feature() {
        let params = ForestParams {
            n_estimators: 10,
            ..Default::default()
        };
        let importances = RandomForest::fit(&hourly_data(), &params)
            .unwrap()
            .feature_importances();
        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }
}
