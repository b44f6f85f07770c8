//! In-memory CSV Table

use crate::coerce::to_numeric;
use crate::error::CleanError;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// A CSV table of string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from headers and rows; short rows are padded with empty cells
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { headers, rows }
    }

    /// Load a CSV file. Non UTF-8 bytes are replaced rather than rejected.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, CleanError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleanError::FileNotFound(path.display().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .collect(),
            );
        }

        info!("Loaded {} rows x {} columns from {}", rows.len(), headers.len(), path.display());
        Ok(Self::new(headers, rows))
    }

    /// Write the table as CSV
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), CleanError> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of a column
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Cells of a column coerced to numbers; unreadable cells become `None`
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|cells| cells.into_iter().map(to_numeric).collect())
    }

    /// Remove exact duplicate rows, keeping the first occurrence
    pub fn drop_duplicates(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::with_capacity(before);
        self.rows.retain(|r| seen.insert(r.clone()));
        let removed = before - self.rows.len();
        debug!("Dropped {} duplicate rows", removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Table {
        Table::new(
            vec!["hr".into(), "temp".into()],
            vec![
                vec!["1".into(), "0.2".into()],
                vec!["2".into(), "?".into()],
                vec!["1".into(), "0.2".into()],
            ],
        )
    }

    #[test]
    fn test_numeric_column() {
        let table = sample();
        assert_eq!(table.numeric_column("temp").unwrap(), vec![Some(0.2), None, Some(0.2)]);
        assert!(table.numeric_column("missing").is_none());
    }

    #[test]
    fn test_drop_duplicates() {
        let mut table = sample();
        assert_eq!(table.drop_duplicates(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_short_rows_padded() {
        let table = Table::new(vec!["a".into(), "b".into()], vec![vec!["1".into()]]);
        assert_eq!(table.column("b").unwrap(), vec![""]);
    }

    #[test]
    fn test_csv_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hr,temp").unwrap();
        writeln!(file, "5,0.3").unwrap();
        let table = Table::load_csv(file.path()).unwrap();
        assert_eq!(table.headers(), &["hr", "temp"]);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        table.save_csv(&out).unwrap();
        assert_eq!(Table::load_csv(&out).unwrap(), table);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Table::load_csv("/nonexistent.csv"),
            Err(CleanError::FileNotFound(_))
        ));
    }
}
