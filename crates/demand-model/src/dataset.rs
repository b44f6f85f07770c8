//! Training Data

use crate::ModelError;
use data_cleaner::Table;
use feature_encoder::{Schema, TARGET_COLUMNS};
use std::path::Path;
use tracing::{info, warn};

/// Row-major feature matrix with one target per row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    /// Build a dataset; every row needs a target
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self, ModelError> {
        if features.len() != targets.len() {
            return Err(ModelError::InvalidInputShape {
                expected: features.len(),
                actual: targets.len(),
            });
        }
        Ok(Self { features, targets })
    }

    /// Split a processed table into schema features and the `target` column.
    ///
    /// Rows whose target is not a number are skipped; unreadable feature
    /// cells read as 0.
    pub fn from_table(table: &Table, target: &str) -> Result<(Self, Schema), ModelError> {
        let target_idx = table
            .column_index(target)
            .ok_or_else(|| ModelError::MissingColumn(target.to_string()))?;

        let feature_idx: Vec<usize> = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, h)| !TARGET_COLUMNS.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();
        let schema = Schema::new(feature_idx.iter().map(|&i| table.headers()[i].clone()));

        let mut features = Vec::with_capacity(table.len());
        let mut targets = Vec::with_capacity(table.len());
        let mut skipped = 0usize;
        for row in table.rows() {
            let Some(y) = data_cleaner::to_numeric(&row[target_idx]) else {
                skipped += 1;
                continue;
            };
            features.push(
                feature_idx
                    .iter()
                    .map(|&i| data_cleaner::to_numeric(&row[i]).unwrap_or(0.0))
                    .collect(),
            );
            targets.push(y);
        }
        if skipped > 0 {
            warn!("Skipped {} rows without a numeric '{}' target", skipped, target);
        }
        if features.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        Ok((Self { features, targets }, schema))
    }

    /// Load a processed CSV
    pub fn load_csv(path: impl AsRef<Path>, target: &str) -> Result<(Self, Schema), ModelError> {
        let table = Table::load_csv(path.as_ref())?;
        let (data, schema) = Self::from_table(&table, target)?;
        info!(
            "Loaded dataset: {} rows, {} features, target '{}'",
            data.len(),
            schema.len(),
            target
        );
        Ok((data, schema))
    }

    /// Rows at the given indices
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Width of the first row
    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }
}
