//! Cleaning Error Types

use thiserror::Error;

/// Errors while loading or preparing data
#[derive(Debug, Error)]
pub enum CleanError {
    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// CSV parse or write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scaler (de)serialization failure
    #[error("Invalid scaler JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Required column absent from the table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// No rows left to work with
    #[error("Dataset is empty after cleaning")]
    EmptyDataset,
}
