//! Feature Scaling

use crate::error::CleanError;
use feature_encoder::Schema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

const MIN_SPREAD: f64 = 1e-12;

/// Which scaler to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Rescale to [0, 1]
    MinMax,
    /// Zero mean, unit variance
    Standard,
}

/// Fitted transform of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ScalingMethod {
    MinMax { min: f64, max: f64 },
    Standard { mean: f64, std_dev: f64 },
}

impl ScalingMethod {
    /// Fit on a column; an empty column fits the identity transform
    pub fn fit(kind: ScalerKind, values: &[f64]) -> Self {
        match kind {
            ScalerKind::MinMax => {
                if values.is_empty() {
                    return ScalingMethod::MinMax { min: 0.0, max: 1.0 };
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                ScalingMethod::MinMax { min, max }
            }
            ScalerKind::Standard => {
                if values.is_empty() {
                    return ScalingMethod::Standard { mean: 0.0, std_dev: 1.0 };
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                ScalingMethod::Standard {
                    mean,
                    std_dev: variance.sqrt(),
                }
            }
        }
    }

    /// Apply the transform. A constant column maps through with unit spread.
    pub fn transform(&self, value: f64) -> f64 {
        match *self {
            ScalingMethod::MinMax { min, max } => {
                let range = max - min;
                let range = if range.abs() < MIN_SPREAD { 1.0 } else { range };
                (value - min) / range
            }
            ScalingMethod::Standard { mean, std_dev } => {
                let std_dev = if std_dev < MIN_SPREAD { 1.0 } else { std_dev };
                (value - mean) / std_dev
            }
        }
    }
}

/// Scaling for a named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub column: String,
    pub method: ScalingMethod,
}

/// Per-column scaling fitted at training time and reapplied at inference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub columns: Vec<ColumnScaler>,
}

impl FeatureScaler {
    /// Fit one transform per `(column, values)` pair
    pub fn fit<S: AsRef<str>>(kind: ScalerKind, columns: &[(S, Vec<f64>)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, values)| ColumnScaler {
                    column: name.as_ref().to_string(),
                    method: ScalingMethod::fit(kind, values),
                })
                .collect(),
        }
    }

    /// Scale a single value; unknown columns pass through
    pub fn transform_value(&self, column: &str, value: f64) -> f64 {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map_or(value, |c| c.method.transform(value))
    }

    /// Scale an encoded vector in place, locating columns through `schema`
    pub fn apply(&self, schema: &Schema, values: &mut [f64]) {
        for scaler in &self.columns {
            if let Some(v) = schema.position(&scaler.column).and_then(|i| values.get_mut(i)) {
                *v = scaler.method.transform(*v);
            }
        }
    }

    /// Load from JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CleanError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleanError::FileNotFound(path.display().to_string()));
        }
        let scaler: FeatureScaler = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded scaler for {} columns from {}", scaler.columns.len(), path.display());
        Ok(scaler)
    }

    /// Save as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CleanError> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax() {
        let method = ScalingMethod::fit(ScalerKind::MinMax, &[0.0, 50.0, 100.0]);
        assert!((method.transform(50.0) - 0.5).abs() < 1e-12);
        assert!((method.transform(100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard() {
        let method = ScalingMethod::fit(ScalerKind::Standard, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // mean 5, population std dev 2
        assert!((method.transform(7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column() {
        let method = ScalingMethod::fit(ScalerKind::MinMax, &[3.0, 3.0]);
        assert_eq!(method.transform(3.0), 0.0);
    }

    #[test]
    fn test_apply_by_schema() {
        let scaler = FeatureScaler::fit(
            ScalerKind::MinMax,
            &[("temperature", vec![0.0, 0.5]), ("absent", vec![1.0, 2.0])],
        );
        let schema = Schema::new(["hr_sin", "temperature"]);
        let mut values = vec![0.3, 0.25];
        scaler.apply(&schema, &mut values);
        assert_eq!(values, vec![0.3, 0.5]);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        let scaler = FeatureScaler::fit(ScalerKind::Standard, &[("humidity", vec![0.2, 0.4])]);
        scaler.save(&path).unwrap();
        assert_eq!(FeatureScaler::load(&path).unwrap(), scaler);
    }
}
