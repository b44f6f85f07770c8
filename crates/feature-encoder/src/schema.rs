//! Model Input Schema

use crate::cyclic::CYCLIC_FIELDS;
use crate::encoder::PASSTHROUGH_FIELDS;
use crate::one_hot::{Vocabulary, SEASONS, WEATHER_SITUATIONS};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Columns that hold training targets rather than features
pub const TARGET_COLUMNS: [&str; 6] = ["cnt", "count", "casual", "registered", "outcome", "id"];

/// Errors reading or writing a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema file not found: {0}")]
    NotFound(String),
    #[error("Schema I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid CSV header: {0}")]
    Csv(#[from] csv::Error),
}

/// Ordered feature columns a trained model expects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Build a schema from column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Training-time schema for the observed season and weather categories.
    ///
    /// Holds every passthrough and cyclic column, plus a one-hot column for
    /// each observed category in vocabulary order, minus the first vocabulary
    /// category.
    pub fn for_observed<S: AsRef<str>>(observed_seasons: &[S], observed_weather: &[S]) -> Self {
        let mut columns: Vec<String> = PASSTHROUGH_FIELDS.iter().map(|f| f.to_string()).collect();
        for cyclic in CYCLIC_FIELDS {
            columns.push(cyclic.sin_column());
            columns.push(cyclic.cos_column());
        }
        columns.extend(observed_columns(&SEASONS, observed_seasons));
        columns.extend(observed_columns(&WEATHER_SITUATIONS, observed_weather));
        debug!("Derived training schema with {} columns", columns.len());
        Self { columns }
    }

    /// Schema from the header of a processed training CSV, excluding targets
    pub fn from_csv_header(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::NotFound(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?;
        let schema = Self::new(
            headers
                .iter()
                .filter(|h| !TARGET_COLUMNS.contains(h))
                .map(str::to_string),
        );
        info!("Loaded schema from CSV header {}: {} columns", path.display(), schema.len());
        Ok(schema)
    }

    /// Load a schema from a JSON array of column names
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::NotFound(path.display().to_string()));
        }
        let schema: Schema = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded schema from {}: {} columns", path.display(), schema.len());
        Ok(schema)
    }

    /// Load a schema, picking the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::from_csv_header(path),
            _ => Self::load_json(path),
        }
    }

    /// Write the schema as a JSON array
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of a column
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn observed_columns<S: AsRef<str>>(vocab: &Vocabulary, observed: &[S]) -> Vec<String> {
    let observed: Vec<&str> = observed
        .iter()
        .filter_map(|o| vocab.resolve(o.as_ref()))
        .collect();
    vocab
        .categories
        .iter()
        .skip(1)
        .filter(|c| observed.contains(&c.value))
        .filter_map(|c| vocab.column(c.value))
        .collect()
}
