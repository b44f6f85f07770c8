//! Record Encoding and Schema Projection

use crate::cyclic::{encode_cyclic, CYCLIC_FIELDS};
use crate::one_hot::{SEASONS, WEATHER_SITUATIONS};
use crate::record::{fields, RawRecord};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Fields copied into the vector unchanged, in schema order
pub const PASSTHROUGH_FIELDS: [&str; 7] = [
    fields::YEAR_INDEX,
    fields::HOLIDAY,
    fields::WORKING_DAY,
    fields::TEMPERATURE,
    fields::FEELS_LIKE,
    fields::HUMIDITY,
    fields::WINDSPEED,
];

/// Encoded model input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Values in schema order
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Compute every column the record can produce.
///
/// Missing or unreadable fields produce no column. Season and weather are
/// one-hot encoded with the first category dropped; unknown categories give
/// all-zero indicators.
pub fn assemble(record: &RawRecord) -> BTreeMap<String, f64> {
    let mut columns = BTreeMap::new();

    for field in PASSTHROUGH_FIELDS {
        if let Some(v) = record.number(field) {
            columns.insert(field.to_string(), v);
        }
    }

    for cyclic in CYCLIC_FIELDS {
        if let Some(v) = record.number(cyclic.field) {
            let (sin, cos) = encode_cyclic(v, cyclic.period);
            columns.insert(cyclic.sin_column(), sin);
            columns.insert(cyclic.cos_column(), cos);
        }
    }

    for vocab in [SEASONS, WEATHER_SITUATIONS] {
        if let Some(raw) = record.category(vocab.field) {
            columns.extend(vocab.encode(&raw));
        }
    }

    columns
}

/// Encode a record into the column order of `schema`.
///
/// Schema columns the record did not produce are filled with 0. Columns the
/// record produced but the schema lacks are discarded.
pub fn encode_record(record: &RawRecord, schema: &Schema) -> FeatureVector {
    let columns = assemble(record);
    let values: Vec<f64> = schema
        .columns()
        .iter()
        .map(|c| columns.get(c).copied().unwrap_or(0.0))
        .collect();

    let filled = schema.columns().iter().filter(|c| columns.contains_key(*c)).count();
    debug!(
        "Encoded record: {} of {} schema columns present, {} zero-filled",
        filled,
        schema.len(),
        schema.len() - filled
    );

    FeatureVector { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn morning_record() -> RawRecord {
        RawRecord::new()
            .with("hour", 8)
            .with("month", 6)
            .with("weekday", 1)
            .with("temperature", 0.5)
            .with("humidity", 0.6)
            .with("windspeed", 0.2)
            .with("season", "fall")
            .with("weather-situation", "clear")
            .with("holiday", 0)
            .with("working-day", 1)
            .with("year-index", 1)
    }

    fn reference_schema() -> Schema {
        Schema::new([
            "year-index",
            "holiday",
            "working-day",
            "temperature",
            "humidity",
            "windspeed",
            "hr_sin",
            "hr_cos",
            "mnth_sin",
            "mnth_cos",
            "season_summer",
            "season_winter",
            "weather_Mist",
        ])
    }

    #[test]
    fn test_reference_vector() {
        let vector = encode_record(&morning_record(), &reference_schema());
        let expected = [
            1.0,
            0.0,
            1.0,
            0.5,
            0.6,
            0.2,
            (2.0 * PI * 8.0 / 24.0).sin(),
            (2.0 * PI * 8.0 / 24.0).cos(),
            (2.0 * PI * 6.0 / 12.0).sin(),
            (2.0 * PI * 6.0 / 12.0).cos(),
            0.0,
            0.0,
            0.0,
        ];
        assert_eq!(vector.len(), expected.len());
        for (got, want) in vector.values.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_length_matches_schema() {
        let schema = Schema::for_observed(&["spring", "summer", "fall", "winter"], &["clear", "mist"]);
        let vector = encode_record(&morning_record(), &schema);
        assert_eq!(vector.len(), schema.len());

        let empty = encode_record(&RawRecord::new(), &schema);
        assert_eq!(empty.len(), schema.len());
        assert!(empty.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_unknown_weather_zero_fills() {
        let record = morning_record().with("weather-situation", "tornado");
        let schema = Schema::new(["weather_Mist", "weather_Light Snow", "weather_Heavy Rain"]);
        let vector = encode_record(&record, &schema);
        assert_eq!(vector.values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_selected_category() {
        let record = morning_record().with("season", "summer").with("weathersit", 2);
        let schema = Schema::new(["season_summer", "season_winter", "weather_Mist"]);
        let vector = encode_record(&record, &schema);
        assert_eq!(vector.values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_assemble_drops_first_category() {
        let columns = assemble(&morning_record());
        assert!(!columns.contains_key("season_spring"));
        assert!(!columns.contains_key("weather_Clear"));
        assert_eq!(columns.get("season_fall"), Some(&1.0));
        // no day-of-month in the record
        assert!(!columns.contains_key("day_sin"));
    }

    #[test]
    fn test_malformed_numeric_zero_fills() {
        let record = morning_record().with("temperature", "?");
        let schema = Schema::new(["temperature", "humidity"]);
        let vector = encode_record(&record, &schema);
        assert_eq!(vector.values, vec![0.0, 0.6]);
    }
}
