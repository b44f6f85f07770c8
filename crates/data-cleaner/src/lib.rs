//! Data Cleaning and Preparation
//!
//! Loads the raw bike-sharing CSV, coerces dirty columns to numbers, imputes
//! missing values, optionally removes outliers and scales the environmental
//! columns, then encodes every row into the processed training table.

mod coerce;
mod error;
mod imputer;
mod outlier;
mod prepare;
mod scaler;
mod table;

pub use coerce::{parse_date, to_flag, to_numeric};
pub use error::CleanError;
pub use imputer::{impute, median, mode, ImputeStrategy};
pub use outlier::{iqr_keep_mask, quantile, IqrBounds};
pub use prepare::{prepare, CleaningReport, PrepareOptions, PreparedData};
pub use scaler::{ColumnScaler, FeatureScaler, ScalerKind, ScalingMethod};
pub use table::Table;
