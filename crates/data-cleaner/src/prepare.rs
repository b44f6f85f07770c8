//! Raw Dataset Preparation
//!
//! Cleans the raw hourly bike-sharing table and encodes every row through the
//! same [`encode_record`] path used at inference time, so the processed table
//! and the persisted schema always agree.

use crate::coerce::{parse_date, to_flag, to_numeric};
use crate::error::CleanError;
use crate::imputer::{impute, mode, ImputeStrategy};
use crate::outlier::iqr_keep_mask;
use crate::scaler::{FeatureScaler, ScalerKind};
use crate::table::Table;
use chrono::{Datelike, NaiveDate};
use feature_encoder::{canonical_field_name, encode_record, fields, RawRecord, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Calendar year mapped to `year-index` 0
const BASE_YEAR: i32 = 2011;

/// Target columns carried into the processed table, in output order
const TARGETS: [&str; 3] = ["casual", "registered", "cnt"];

const ENVIRONMENTAL: [&str; 4] = [
    fields::TEMPERATURE,
    fields::FEELS_LIKE,
    fields::HUMIDITY,
    fields::WINDSPEED,
];

/// Preparation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareOptions {
    /// Drop exact duplicate rows first
    pub drop_duplicates: bool,
    /// Drop rows with IQR outliers in the environmental columns
    pub drop_outliers: bool,
    /// IQR multiplier for outlier bounds
    pub outlier_k: f64,
    /// Scaler fitted on the environmental columns, if any
    pub scaler: Option<ScalerKind>,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            drop_outliers: false,
            outlier_k: 1.5,
            scaler: Some(ScalerKind::MinMax),
        }
    }
}

/// What cleaning did to the data
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub dates_parsed: usize,
    /// Imputed cell count per field
    pub imputed: BTreeMap<String, usize>,
    pub targets_reconstructed: usize,
    pub rows_missing_targets: usize,
    pub outliers_removed: usize,
    pub rows_out: usize,
}

/// Output of [`prepare`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Encoded feature columns followed by targets
    pub table: Table,
    /// Feature columns the model is trained on
    pub schema: Schema,
    /// Scaler fitted on the training data
    pub scaler: Option<FeatureScaler>,
    pub report: CleaningReport,
}

fn column_cells<'a>(table: &'a Table, field: &str) -> Option<Vec<&'a str>> {
    let name = table
        .headers()
        .iter()
        .find(|h| canonical_field_name(h) == field)?;
    table.column(name)
}

fn numeric(table: &Table, field: &str) -> Vec<Option<f64>> {
    column_cells(table, field)
        .map(|cells| cells.into_iter().map(to_numeric).collect())
        .unwrap_or_else(|| vec![None; table.len()])
}

fn flags(table: &Table, field: &str, yes: &[&str], no: &[&str]) -> Vec<Option<f64>> {
    column_cells(table, field)
        .map(|cells| cells.into_iter().map(|c| to_flag(c, yes, no)).collect())
        .unwrap_or_else(|| vec![None; table.len()])
}

fn categories(table: &Table, field: &str) -> Vec<Option<String>> {
    column_cells(table, field)
        .map(|cells| {
            cells
                .into_iter()
                .map(|c| {
                    let c = c.trim();
                    (!c.is_empty() && c != "?").then(|| c.to_string())
                })
                .collect()
        })
        .unwrap_or_else(|| vec![None; table.len()])
}

fn impute_category(values: &mut [Option<String>]) -> usize {
    let Some(fill) = mode(values.iter().flatten().cloned()) else {
        return 0;
    };
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_none()) {
        *v = Some(fill.clone());
        filled += 1;
    }
    filled
}

/// Clean and encode the raw dataset.
///
/// Malformed numbers are coerced to missing and imputed (median for the
/// environmental columns, mode for flags and categories) without being
/// reported as errors; the counts end up in [`CleaningReport::imputed`].
pub fn prepare(raw: &Table, options: &PrepareOptions) -> Result<PreparedData, CleanError> {
    let mut table = raw.clone();
    let mut report = CleaningReport {
        rows_in: table.len(),
        ..Default::default()
    };

    if options.drop_duplicates {
        report.duplicates_removed = table.drop_duplicates();
    }
    if table.is_empty() {
        return Err(CleanError::EmptyDataset);
    }
    let n = table.len();

    // Dates recover month, year and day-of-month when the numeric columns are dirty
    let dates: Vec<Option<NaiveDate>> = table
        .column("dteday")
        .map(|cells| cells.into_iter().map(parse_date).collect())
        .unwrap_or_else(|| vec![None; n]);

    let mut numeric_fields: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for field in ENVIRONMENTAL.iter().chain(&[
        fields::HOUR,
        fields::MONTH,
        fields::WEEKDAY,
        fields::DAY_OF_MONTH,
        fields::YEAR_INDEX,
    ]) {
        numeric_fields.insert(*field, numeric(&table, field));
    }

    for (i, date) in dates.iter().enumerate() {
        let Some(date) = date else { continue };
        report.dates_parsed += 1;
        let updates = [
            (fields::MONTH, date.month() as f64),
            (fields::DAY_OF_MONTH, date.day() as f64),
            (fields::YEAR_INDEX, (date.year() - BASE_YEAR) as f64),
        ];
        for (field, value) in updates {
            if let Some(column) = numeric_fields.get_mut(field) {
                column[i] = Some(value);
            }
        }
    }

    let strategies = [
        (fields::TEMPERATURE, ImputeStrategy::Median),
        (fields::FEELS_LIKE, ImputeStrategy::Median),
        (fields::HUMIDITY, ImputeStrategy::Median),
        (fields::WINDSPEED, ImputeStrategy::Median),
        (fields::HOUR, ImputeStrategy::Constant(0.0)),
        (fields::MONTH, ImputeStrategy::Constant(1.0)),
        (fields::WEEKDAY, ImputeStrategy::Constant(0.0)),
        (fields::DAY_OF_MONTH, ImputeStrategy::Mode),
        (fields::YEAR_INDEX, ImputeStrategy::Mode),
    ];
    for (field, strategy) in strategies {
        if let Some(column) = numeric_fields.get_mut(field) {
            // columns the table never had stay empty rather than becoming constants
            if column.iter().all(Option::is_none) {
                continue;
            }
            let filled = impute(column, strategy);
            if filled > 0 {
                debug!("Imputed {} missing {} values with {:?}", filled, field, strategy);
                report.imputed.insert(field.to_string(), filled);
            }
        }
    }

    let mut holiday = flags(&table, fields::HOLIDAY, &["yes"], &["no"]);
    let mut working_day = flags(
        &table,
        fields::WORKING_DAY,
        &["working day", "yes"],
        &["no work", "no"],
    );
    for (field, column) in [(fields::HOLIDAY, &mut holiday), (fields::WORKING_DAY, &mut working_day)] {
        let filled = impute(column, ImputeStrategy::Mode);
        if filled > 0 {
            report.imputed.insert(field.to_string(), filled);
        }
    }

    let mut season = categories(&table, fields::SEASON);
    let mut weather = categories(&table, fields::WEATHER);
    for (field, column) in [(fields::SEASON, &mut season), (fields::WEATHER, &mut weather)] {
        let filled = impute_category(column);
        if filled > 0 {
            report.imputed.insert(field.to_string(), filled);
        }
    }

    // Targets: casual + registered = cnt
    let has_split = table.column_index("casual").is_some() || table.column_index("registered").is_some();
    let has_count = table.column_index("cnt").is_some();
    let mut targets: BTreeMap<&str, Vec<Option<f64>>> = TARGETS
        .iter()
        .filter(|t| table.column_index(t).is_some())
        .map(|t| (*t, table.numeric_column(t).unwrap_or_default()))
        .collect();

    let mut keep: Vec<usize> = Vec::with_capacity(n);
    for i in 0..n {
        let get = |t: &str, targets: &BTreeMap<&str, Vec<Option<f64>>>| {
            targets.get(t).and_then(|c| c[i])
        };
        let casual = get("casual", &targets);
        let registered = get("registered", &targets);
        let cnt = get("cnt", &targets);

        match (casual, registered, cnt) {
            (None, Some(r), Some(c)) if targets.contains_key("casual") => {
                if let Some(col) = targets.get_mut("casual") {
                    col[i] = Some(c - r);
                }
                report.targets_reconstructed += 1;
            }
            (Some(a), None, Some(c)) if targets.contains_key("registered") => {
                if let Some(col) = targets.get_mut("registered") {
                    col[i] = Some(c - a);
                }
                report.targets_reconstructed += 1;
            }
            _ => {}
        }

        let both_split_missing = has_split && casual.is_none() && registered.is_none();
        let count_missing = has_count && cnt.is_none();
        if both_split_missing || count_missing {
            report.rows_missing_targets += 1;
            continue;
        }
        keep.push(i);
    }
    if report.rows_missing_targets > 0 {
        warn!("Dropped {} rows with missing targets", report.rows_missing_targets);
    }

    let env_value = |field: &str, i: usize| {
        numeric_fields
            .get(field)
            .and_then(|c| c[i])
            .unwrap_or(0.0)
    };

    if options.drop_outliers {
        let env_columns: Vec<Vec<f64>> = ENVIRONMENTAL
            .iter()
            .copied()
            .filter(|f| numeric_fields.get(f).is_some_and(|c| c.iter().any(Option::is_some)))
            .map(|f| keep.iter().map(|&i| env_value(f, i)).collect())
            .collect();
        let mask = iqr_keep_mask(&env_columns, options.outlier_k);
        let before = keep.len();
        keep = keep
            .into_iter()
            .zip(mask)
            .filter_map(|(i, k)| k.then_some(i))
            .collect();
        report.outliers_removed = before - keep.len();
        debug!("Removed {} outlier rows", report.outliers_removed);
    }

    if keep.is_empty() {
        return Err(CleanError::EmptyDataset);
    }

    let scaler = options.scaler.map(|kind| {
        let columns: Vec<(&str, Vec<f64>)> = ENVIRONMENTAL
            .iter()
            .copied()
            .map(|f| (f, keep.iter().map(|&i| env_value(f, i)).collect()))
            .collect();
        FeatureScaler::fit(kind, &columns)
    });

    let records: Vec<RawRecord> = keep
        .iter()
        .map(|&i| {
            let mut record = RawRecord::new();
            for (field, column) in &numeric_fields {
                if let Some(v) = column[i] {
                    record.insert(field, v);
                }
            }
            for (field, column) in [(fields::HOLIDAY, &holiday), (fields::WORKING_DAY, &working_day)] {
                if let Some(v) = column[i] {
                    record.insert(field, v);
                }
            }
            for (field, column) in [(fields::SEASON, &season), (fields::WEATHER, &weather)] {
                if let Some(v) = &column[i] {
                    record.insert(field, v.as_str());
                }
            }
            record
        })
        .collect();

    let observed = |column: &[Option<String>]| -> Vec<String> {
        let mut values: Vec<String> = keep.iter().filter_map(|&i| column[i].clone()).collect();
        values.sort();
        values.dedup();
        values
    };
    let schema = Schema::for_observed(&observed(&season[..]), &observed(&weather[..]));

    let target_names: Vec<&str> = TARGETS.iter().copied().filter(|t| targets.contains_key(t)).collect();
    let mut headers: Vec<String> = schema.columns().to_vec();
    headers.extend(target_names.iter().map(|t| t.to_string()));

    let rows: Vec<Vec<String>> = keep
        .iter()
        .zip(&records)
        .map(|(&i, record)| {
            let mut values = encode_record(record, &schema).values;
            if let Some(scaler) = &scaler {
                scaler.apply(&schema, &mut values);
            }
            let mut row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            for t in &target_names {
                row.push(targets[t][i].map(|v| v.to_string()).unwrap_or_default());
            }
            row
        })
        .collect();

    report.rows_out = rows.len();
    info!(
        "Prepared {} of {} rows into {} feature columns",
        report.rows_out,
        report.rows_in,
        schema.len()
    );

    Ok(PreparedData {
        table: Table::new(headers, rows),
        schema,
        scaler,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Table {
        let headers = "instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt";
        let rows = [
            "1,01-01-2011,springer,0,1,0,No,6,No work,Clear,0.24,0.2879,0.81,0,3,13,16",
            "2,01-01-2011,springer,0,1,1,No,6,No work,Clear,0.22,0.2727,0.8,0,8,32,40",
            "3,01-01-2011,springer,0,?,2,?,6,No work,Mist,?,0.2727,0.8,0,?,27,32",
            "4,15-07-2012,fall,1,7,17,No,0,?,Clear,0.8,0.75,0.4,0.2,100,300,400",
            "5,15-07-2012,fall,1,7,18,No,0,No work,?,0.78,0.7,0.45,0.25,?,?,380",
            "5,15-07-2012,fall,1,7,18,No,0,No work,?,0.78,0.7,0.45,0.25,?,?,380",
        ];
        Table::new(
            headers.split(',').map(String::from).collect(),
            rows.iter()
                .map(|r| r.split(',').map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_prepare_cleans_and_encodes() {
        let prepared = prepare(&raw(), &PrepareOptions::default()).unwrap();
        let report = &prepared.report;

        assert_eq!(report.rows_in, 6);
        assert_eq!(report.duplicates_removed, 1);
        // row 5 has neither casual nor registered
        assert_eq!(report.rows_missing_targets, 1);
        assert_eq!(report.rows_out, 4);
        assert_eq!(report.targets_reconstructed, 1);
        assert_eq!(report.imputed.get(fields::TEMPERATURE), Some(&1));
        assert_eq!(report.imputed.get(fields::HOLIDAY), Some(&1));

        let table = &prepared.table;
        assert_eq!(table.len(), 4);
        assert_eq!(table.headers().len(), prepared.schema.len() + 3);
        assert_eq!(&table.headers()[table.headers().len() - 3..], &["casual", "registered", "cnt"]);

        // casual reconstructed as cnt - registered
        assert_eq!(table.column("casual").unwrap()[2], "5");
    }

    #[test]
    fn test_schema_follows_observed_categories() {
        let prepared = prepare(&raw(), &PrepareOptions::default()).unwrap();
        let schema = &prepared.schema;
        assert!(schema.position("season_fall").is_some());
        assert!(schema.position("season_summer").is_none());
        assert!(schema.position("season_spring").is_none());
        assert!(schema.position("weather_Mist").is_some());
        assert!(schema.position("cnt").is_none());
    }

    #[test]
    fn test_scaling_applied() {
        let prepared = prepare(&raw(), &PrepareOptions::default()).unwrap();
        let temps: Vec<f64> = prepared
            .table
            .numeric_column(fields::TEMPERATURE)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-12);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(prepared.scaler.is_some());
    }

    #[test]
    fn test_without_scaling() {
        let options = PrepareOptions {
            scaler: None,
            ..Default::default()
        };
        let prepared = prepare(&raw(), &options).unwrap();
        assert!(prepared.scaler.is_none());
        assert_eq!(prepared.table.column(fields::TEMPERATURE).unwrap()[0], "0.24");
    }

    #[test]
    fn test_date_overrides_dirty_month() {
        let options = PrepareOptions {
            scaler: None,
            ..Default::default()
        };
        let prepared = prepare(&raw(), &options).unwrap();
        let table = &prepared.table;
        let (s, c) = feature_encoder::encode_cyclic(1.0, 12.0);
        assert_eq!(table.column("mnth_sin").unwrap()[2], s.to_string());
        assert_eq!(table.column("mnth_cos").unwrap()[2], c.to_string());
        assert_eq!(table.column(fields::YEAR_INDEX).unwrap()[3], "1");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(vec!["cnt".into()], vec![]);
        assert!(matches!(
            prepare(&table, &PrepareOptions::default()),
            Err(CleanError::EmptyDataset)
        ));
    }
}
