//! Regression Metrics

use crate::dataset::Dataset;
use crate::Regressor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard regression error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Rows evaluated
    pub samples: usize,
}

impl RegressionMetrics {
    /// Compare predictions against actual values
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
                samples: 0,
            };
        }
        let nf = n as f64;
        let mean = actual[..n].iter().sum::<f64>() / nf;

        let mut ss_res = 0.0;
        let mut abs = 0.0;
        let mut ss_tot = 0.0;
        for (y, p) in actual.iter().zip(predicted) {
            let e = y - p;
            ss_res += e * e;
            abs += e.abs();
            ss_tot += (y - mean).powi(2);
        }

        // constant targets: perfect fit scores 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        let mse = ss_res / nf;
        Self {
            mse,
            rmse: mse.sqrt(),
            mae: abs / nf,
            r2,
            samples: n,
        }
    }

    /// Evaluate a model on a dataset
    pub fn evaluate<R: Regressor + ?Sized>(model: &R, data: &Dataset) -> Self {
        let predicted = model.predict_batch(&data.features);
        Self::from_predictions(&data.targets, &predicted)
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean Squared Error: {:.4}", self.mse)?;
        writeln!(f, "Root Mean Squared Error: {:.4}", self.rmse)?;
        writeln!(f, "Mean Absolute Error: {:.4}", self.mae)?;
        write!(f, "R-squared: {:.4}", self.r2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let m = RegressionMetrics::from_predictions(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_known_values() {
        let m = RegressionMetrics::from_predictions(&[3.0, -0.5, 2.0, 7.0], &[2.5, 0.0, 2.0, 8.0]);
        assert!((m.mse - 0.375).abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
        assert!((m.r2 - 0.948_608_137).abs() < 1e-6);
    }

    #[test]
    fn test_constant_actuals() {
        let m = RegressionMetrics::from_predictions(&[2.0, 2.0], &[1.0, 3.0]);
        assert_eq!(m.r2, 0.0);
    }

    #[test]
    fn test_display() {
        let m = RegressionMetrics::from_predictions(&[1.0], &[1.5]);
        assert!(m.to_string().starts_with("Mean Squared Error: 0.2500"));
    }
}
